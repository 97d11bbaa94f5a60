use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{CopilotError, Result};

/// Canonical month pattern shared with the intent schema.
pub const MONTH_PATTERN: &str = "^[0-9]{4}-(0[1-9]|1[0-2])$";

static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MONTH_PATTERN).expect("month pattern compiles"));

pub fn is_canonical(value: &str) -> bool {
    MONTH_RE.is_match(value)
}

pub fn validate(value: &str) -> Result<()> {
    if is_canonical(value) {
        Ok(())
    } else {
        Err(CopilotError::InvalidMonth(value.to_string()))
    }
}

/// Normalize a month cell from a CSV export to `YYYY-MM`.
///
/// Accepts `YYYY-MM`, `YYYY/MM`, `YYYY-MM-DD` and `YYYY/MM/DD`; the day is dropped.
pub fn normalize(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if is_canonical(raw) {
        return Ok(raw.to_string());
    }
    let candidates = [
        (raw.to_string(), "%Y-%m-%d"),
        (raw.to_string(), "%Y/%m/%d"),
        (format!("{raw}/01"), "%Y/%m/%d"),
    ];
    candidates
        .iter()
        .find_map(|(text, fmt)| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|d| d.format("%Y-%m").to_string())
        .ok_or_else(|| CopilotError::InvalidMonth(raw.to_string()))
}

/// Human label for a canonical month: `2025-06` -> `Jun 2025`.
pub fn label(month: &str) -> String {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| month.to_string())
}

/// Label for an inclusive span of canonical months.
pub fn span_label(first: &str, last: &str) -> String {
    if first == last {
        label(first)
    } else {
        format!("{} to {}", label(first), label(last))
    }
}
