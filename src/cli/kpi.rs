use std::path::Path;

use serde_json::json;

use crate::cli::render::format_result;
use crate::error::Result;
use crate::intent::{Intent, RawIntent};
use crate::router;
use crate::store::DataStore;

/// Build a classifier record from `kpi` flags.
pub fn intent_from_flags(
    kind: String,
    period_start: Option<String>,
    period_end: Option<String>,
    month: Option<String>,
    entity: Option<String>,
) -> RawIntent {
    RawIntent {
        kind,
        period_start,
        period_end,
        month,
        entity,
    }
}

/// Parse inline JSON, or read it from a file when prefixed with `@`.
pub fn intent_from_input(input: &str) -> Result<RawIntent> {
    match input.strip_prefix('@') {
        Some(path) => RawIntent::from_json(&std::fs::read_to_string(path)?),
        None => RawIntent::from_json(input),
    }
}

pub fn run(data_dir: &Path, raw: RawIntent, as_json: bool) -> Result<()> {
    raw.validate()?;
    let intent = Intent::resolve(&raw)?;
    let store = DataStore::load(data_dir)?;
    let result = router::execute(&store, &intent);

    if as_json {
        let body = json!({
            "intent": raw,
            "kind": result.kind().key(),
            "rows": result.records()?,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", format_result(&intent, &result));
    }
    Ok(())
}
