use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{CopilotError, Result};
use crate::intent::{IntentKind, RawIntent};

/// Turns a question into a classifier record. Production classifiers are
/// external language models constrained by [`crate::intent::intent_schema`].
pub trait IntentClassifier {
    fn classify(&self, question: &str) -> Result<RawIntent>;
}

/// Weighted keywords per KPI. Terms that name one KPI outweigh generic
/// finance words; earlier entries win remaining ties.
const KIND_KEYWORDS: &[(IntentKind, &[(&str, usize)])] = &[
    (
        IntentKind::RevenueVsBudget,
        &[
            ("budget", 2),
            ("variance", 2),
            ("plan", 1),
            ("revenue", 1),
            ("forecast", 1),
        ],
    ),
    (
        IntentKind::GrossMarginPct,
        &[
            ("gross margin", 3),
            ("gm%", 3),
            ("gm %", 3),
            ("cogs", 2),
            ("margin", 1),
        ],
    ),
    (
        IntentKind::OpexBreakdown,
        &[
            ("opex", 3),
            ("operating expense", 3),
            ("breakdown", 1),
            ("expenses", 1),
            ("spend", 1),
        ],
    ),
    (
        IntentKind::EbitdaProxy,
        &[
            ("ebitda", 3),
            ("operating profit", 3),
            ("profit", 1),
            ("earnings", 1),
        ],
    ),
    (
        IntentKind::CashRunway,
        &[
            ("runway", 3),
            ("months left", 3),
            ("burn", 2),
            ("cash", 1),
        ],
    ),
];

const MONTH_NAMES: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static NAMED_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?",
        r"|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)",
        r"\.?,?\s+(\d{4})\b",
    ))
    .expect("named month pattern compiles")
});

static ISO_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(0[1-9]|1[0-2])\b").expect("iso month pattern compiles")
});

static QUARTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bq([1-4])\s*(\d{4})\b").expect("quarter pattern compiles")
});

/// Pick the KPI with the highest keyword score.
pub fn score_kind(question: &str) -> Option<IntentKind> {
    let text = question.to_lowercase();
    let mut best: Option<(IntentKind, usize)> = None;
    for (kind, keywords) in KIND_KEYWORDS {
        let score: usize = keywords
            .iter()
            .filter(|(kw, _)| text.contains(kw))
            .map(|(_, weight)| weight)
            .sum();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((*kind, score));
        }
    }
    best.map(|(kind, _)| kind)
}

/// Canonical months mentioned in the question, in order of appearance.
/// A quarter contributes its first and last month.
pub fn extract_months(question: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    for caps in NAMED_MONTH_RE.captures_iter(question) {
        let name = caps[1].to_lowercase();
        if let Some(idx) = MONTH_NAMES.iter().position(|m| name.starts_with(m)) {
            let start = caps.get(0).map_or(0, |m| m.start());
            found.push((start, format!("{}-{:02}", &caps[2], idx + 1)));
        }
    }
    for caps in ISO_MONTH_RE.captures_iter(question) {
        let start = caps.get(0).map_or(0, |m| m.start());
        found.push((start, format!("{}-{}", &caps[1], &caps[2])));
    }
    for caps in QUARTER_RE.captures_iter(question) {
        let start = caps.get(0).map_or(0, |m| m.start());
        let q: usize = caps[1].parse().unwrap_or(1);
        let first = (q - 1) * 3 + 1;
        found.push((start, format!("{}-{:02}", &caps[2], first)));
        found.push((start + 1, format!("{}-{:02}", &caps[2], first + 2)));
    }
    found.sort_by_key(|(pos, _)| *pos);

    let mut months: Vec<String> = Vec::new();
    for (_, m) in found {
        if !months.contains(&m) {
            months.push(m);
        }
    }
    months
}

pub struct KeywordClassifier {
    entities: Vec<String>,
}

impl KeywordClassifier {
    /// `entities` are the names an entity filter may match, e.g. from
    /// [`crate::store::DataStore::entities`].
    pub fn new(entities: Vec<String>) -> Self {
        Self { entities }
    }

    fn find_entity(&self, question: &str) -> Option<String> {
        self.entities
            .iter()
            .find(|e| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(e)))
                    .map(|re| re.is_match(question))
                    .unwrap_or(false)
            })
            .cloned()
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, question: &str) -> Result<RawIntent> {
        let kind = score_kind(question).ok_or_else(|| {
            CopilotError::InvalidIntent(format!("no KPI recognised in question: {question}"))
        })?;
        let mut intent = RawIntent::new(kind);
        intent.entity = self.find_entity(question);

        let months = extract_months(question);
        match months.as_slice() {
            [] => {}
            [single] => intent.month = Some(single.clone()),
            many => {
                intent.period_start = many.iter().min().cloned();
                intent.period_end = many.iter().max().cloned();
            }
        }
        debug!(?intent, "keyword classification");
        Ok(intent)
    }
}
