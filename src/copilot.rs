use tracing::info;

use crate::classifier::IntentClassifier;
use crate::error::Result;
use crate::intent::{Intent, RawIntent};
use crate::narrator::Narrator;
use crate::router::{self, KpiResult};
use crate::store::DataStore;

pub struct Answer {
    pub question: String,
    pub raw_intent: RawIntent,
    pub intent: Intent,
    pub result: KpiResult,
    pub summary: String,
}

/// Classify, compute and narrate one question against a loaded store.
///
/// Stages run in order; the first failing stage fails the whole question and
/// nothing partial is returned.
pub struct Copilot<'a, C, N> {
    store: &'a DataStore,
    classifier: C,
    narrator: N,
}

impl<'a, C: IntentClassifier, N: Narrator> Copilot<'a, C, N> {
    pub fn new(store: &'a DataStore, classifier: C, narrator: N) -> Self {
        Self {
            store,
            classifier,
            narrator,
        }
    }

    pub fn ask(&self, question: &str) -> Result<Answer> {
        info!(question, "classifying");
        let raw_intent = self.classifier.classify(question)?;
        raw_intent.validate()?;
        let intent = Intent::resolve(&raw_intent)?;

        info!(kind = intent.kind().key(), "computing");
        let result = router::execute(self.store, &intent);

        info!("summarizing");
        let summary = self.narrator.narrate(question, &intent, &result)?;

        Ok(Answer {
            question: question.to_string(),
            raw_intent,
            intent,
            result,
            summary,
        })
    }
}
