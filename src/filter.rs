use crate::models::{CashRecord, FxRate, LedgerRecord};
use crate::month;

/// Inclusive month range. Either bound may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Period {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl Period {
    /// Blank bounds are treated as open.
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        let clean = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Self {
            start: clean(start),
            end: clean(end),
        }
    }

    pub fn single(month: &str) -> Self {
        Self::new(Some(month), Some(month))
    }

    pub fn contains(&self, month: &str) -> bool {
        if let Some(start) = &self.start {
            if month < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if month > end.as_str() {
                return false;
            }
        }
        true
    }

    pub fn describe(&self) -> String {
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => month::span_label(s, e),
            (Some(s), None) => format!("since {}", month::label(s)),
            (None, Some(e)) => format!("through {}", month::label(e)),
            (None, None) => "all months".to_string(),
        }
    }
}

/// A row that can be scoped by month and, when the table has one, entity.
pub trait Scoped {
    fn month(&self) -> &str;

    fn entity(&self) -> Option<&str> {
        None
    }
}

impl Scoped for LedgerRecord {
    fn month(&self) -> &str {
        &self.month
    }

    fn entity(&self) -> Option<&str> {
        Some(&self.entity)
    }
}

impl Scoped for CashRecord {
    fn month(&self) -> &str {
        &self.month
    }

    fn entity(&self) -> Option<&str> {
        Some(&self.entity)
    }
}

impl Scoped for FxRate {
    fn month(&self) -> &str {
        &self.month
    }
}

/// Restrict rows to `period` and, when given, a case-insensitive entity match.
///
/// Rows without an entity column ignore the entity filter. A start after the
/// end simply matches nothing. Input order is preserved.
pub fn filter<'a, T: Scoped>(rows: &'a [T], period: &Period, entity: Option<&str>) -> Vec<&'a T> {
    let wanted = entity
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase);
    rows.iter()
        .filter(|row| period.contains(row.month()))
        .filter(|row| match (&wanted, row.entity()) {
            (Some(want), Some(have)) => have.to_lowercase() == *want,
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<LedgerRecord> {
        vec![
            LedgerRecord::new("2024-11", "ParentCo", "Revenue", 1.0),
            LedgerRecord::new("2024-12", "EMEA", "Revenue", 2.0),
            LedgerRecord::new("2025-01", "ParentCo", "Revenue", 3.0),
            LedgerRecord::new("2025-02", "parentco", "COGS", 4.0),
        ]
    }

    fn months(out: &[&LedgerRecord]) -> Vec<String> {
        out.iter().map(|r| r.month.clone()).collect()
    }

    #[test]
    fn test_no_bounds_keeps_everything() {
        let data = rows();
        assert_eq!(filter(&data, &Period::default(), None).len(), 4);
    }

    #[test]
    fn test_inclusive_bounds() {
        let data = rows();
        let out = filter(&data, &Period::new(Some("2024-12"), Some("2025-01")), None);
        assert_eq!(months(&out), vec!["2024-12", "2025-01"]);

        let out = filter(&data, &Period::new(Some("2025-01"), None), None);
        assert_eq!(months(&out), vec!["2025-01", "2025-02"]);

        let out = filter(&data, &Period::new(None, Some("2024-11")), None);
        assert_eq!(months(&out), vec!["2024-11"]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let data = rows();
        let out = filter(&data, &Period::new(Some("2025-02"), Some("2024-11")), None);
        assert!(out.is_empty());
    }

    #[test]
    fn test_entity_is_case_insensitive() {
        let data = rows();
        let out = filter(&data, &Period::default(), Some("PARENTCO"));
        assert_eq!(months(&out), vec!["2024-11", "2025-01", "2025-02"]);
    }

    #[test]
    fn test_blank_entity_and_bounds_are_ignored() {
        let data = rows();
        let out = filter(&data, &Period::new(Some(""), Some("  ")), Some(""));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_entity_filter_is_noop_without_entity_column() {
        let fx = vec![FxRate {
            month: "2025-01".to_string(),
            currency: "EUR".to_string(),
            rate_to_usd: 1.08,
        }];
        assert_eq!(filter(&fx, &Period::default(), Some("ParentCo")).len(), 1);
    }

    #[test]
    fn test_output_months_stay_within_bounds() {
        let data = rows();
        let period = Period::new(Some("2024-12"), Some("2025-02"));
        for row in filter(&data, &period, None) {
            assert!(row.month.as_str() >= "2024-12" && row.month.as_str() <= "2025-02");
            assert!(data.iter().any(|r| r.month == row.month));
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(Period::single("2025-06").describe(), "Jun 2025");
        assert_eq!(Period::new(Some("2025-01"), None).describe(), "since Jan 2025");
        assert_eq!(Period::default().describe(), "all months");
    }
}
