use std::path::Path;

use colored::Colorize;
use serde_json::json;

use crate::classifier::KeywordClassifier;
use crate::cli::render::format_result;
use crate::copilot::Copilot;
use crate::error::Result;
use crate::narrator::TemplateNarrator;
use crate::store::DataStore;

pub fn run(data_dir: &Path, question: &str, as_json: bool) -> Result<()> {
    let store = DataStore::load(data_dir)?;
    let copilot = Copilot::new(&store, KeywordClassifier::new(store.entities()), TemplateNarrator);
    let answer = copilot.ask(question)?;

    if as_json {
        let body = json!({
            "question": answer.question,
            "intent": answer.raw_intent,
            "rows": answer.result.records()?,
            "summary": answer.summary,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Intent:".bold(),
        serde_json::to_string(&answer.raw_intent)?
    );
    println!();
    println!("{}", "Answer".bold());
    println!("{}", answer.summary);
    println!();
    println!("{}", format_result(&answer.intent, &answer.result));
    Ok(())
}
