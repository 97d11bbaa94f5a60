use serde::Serialize;

/// One row of the actuals or budget table, already converted to USD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRecord {
    pub month: String,
    pub entity: String,
    pub account_category: String,
    pub amount_usd: f64,
}

pub type ActualRecord = LedgerRecord;
pub type BudgetRecord = LedgerRecord;

impl LedgerRecord {
    pub fn new(month: &str, entity: &str, account_category: &str, amount_usd: f64) -> Self {
        Self {
            month: month.to_string(),
            entity: entity.to_string(),
            account_category: account_category.to_string(),
            amount_usd,
        }
    }

    pub fn is_revenue(&self) -> bool {
        self.account_category.to_lowercase() == "revenue"
    }

    pub fn is_cogs(&self) -> bool {
        self.account_category.to_lowercase() == "cogs"
    }

    /// Subcategory of an `Opex:<name>` line, e.g. `Marketing`.
    pub fn opex_subcategory(&self) -> Option<&str> {
        if !self.account_category.to_lowercase().starts_with("opex:") {
            return None;
        }
        self.account_category.split_once(':').map(|(_, sub)| sub)
    }
}

/// Point-in-time cash balance for an entity at month end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashRecord {
    pub month: String,
    pub entity: String,
    pub cash_usd: f64,
}

impl CashRecord {
    pub fn new(month: &str, entity: &str, cash_usd: f64) -> Self {
        Self {
            month: month.to_string(),
            entity: entity.to_string(),
            cash_usd,
        }
    }
}

/// Monthly conversion rate used upstream to produce `amount_usd`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FxRate {
    pub month: String,
    pub currency: String,
    pub rate_to_usd: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_matching_ignores_case() {
        assert!(LedgerRecord::new("2025-01", "A", "Revenue", 1.0).is_revenue());
        assert!(LedgerRecord::new("2025-01", "A", "REVENUE", 1.0).is_revenue());
        assert!(!LedgerRecord::new("2025-01", "A", "Revenue:Other", 1.0).is_revenue());
        assert!(LedgerRecord::new("2025-01", "A", "cogs", 1.0).is_cogs());
    }

    #[test]
    fn test_opex_subcategory() {
        let r = LedgerRecord::new("2025-01", "A", "Opex:R&D", 1.0);
        assert_eq!(r.opex_subcategory(), Some("R&D"));
        let r = LedgerRecord::new("2025-01", "A", "OPEX:Travel:Air", 1.0);
        assert_eq!(r.opex_subcategory(), Some("Travel:Air"));
        let r = LedgerRecord::new("2025-01", "A", "Opex", 1.0);
        assert_eq!(r.opex_subcategory(), None);
        let r = LedgerRecord::new("2025-01", "A", "COGS", 1.0);
        assert_eq!(r.opex_subcategory(), None);
    }
}
