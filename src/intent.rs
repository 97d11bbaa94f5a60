use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{CopilotError, Result};
use crate::filter::Period;
use crate::month::{self, MONTH_PATTERN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    RevenueVsBudget,
    GrossMarginPct,
    OpexBreakdown,
    EbitdaProxy,
    CashRunway,
}

pub const ALL_KINDS: &[IntentKind] = &[
    IntentKind::RevenueVsBudget,
    IntentKind::GrossMarginPct,
    IntentKind::OpexBreakdown,
    IntentKind::EbitdaProxy,
    IntentKind::CashRunway,
];

impl IntentKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::RevenueVsBudget => "revenue_vs_budget",
            Self::GrossMarginPct => "gross_margin_pct",
            Self::OpexBreakdown => "opex_breakdown",
            Self::EbitdaProxy => "ebitda_proxy",
            Self::CashRunway => "cash_runway",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::RevenueVsBudget => "Revenue vs Budget",
            Self::GrossMarginPct => "Gross Margin %",
            Self::OpexBreakdown => "Opex Breakdown",
            Self::EbitdaProxy => "EBITDA (proxy)",
            Self::CashRunway => "Cash Runway",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ALL_KINDS.iter().find(|k| k.key() == key).copied()
    }
}

// ---------------------------------------------------------------------------
// Classifier record
// ---------------------------------------------------------------------------

/// The flat record an intent classifier produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawIntent {
    pub kind: String,
    #[serde(default)]
    pub period_start: Option<String>,
    #[serde(default)]
    pub period_end: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub entity: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl RawIntent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind: kind.key().to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CopilotError::InvalidIntent(e.to_string()))
    }

    /// Check every supplied month against the `YYYY-MM` pattern.
    pub fn validate(&self) -> Result<()> {
        for value in [&self.period_start, &self.period_end, &self.month] {
            if let Some(m) = present(value) {
                month::validate(m)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Resolved intent
// ---------------------------------------------------------------------------

/// Period and entity scope of a range KPI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub period: Period,
    pub entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    RevenueVsBudget(Scope),
    GrossMarginPct(Scope),
    OpexBreakdown { month: String, entity: Option<String> },
    EbitdaProxy(Scope),
    CashRunway(Scope),
}

impl Intent {
    /// Derive the effective scope of a classifier record.
    ///
    /// A `month` collapses the range to that single month. Opex breakdown
    /// takes the first of `month`, `period_end`, `period_start`.
    pub fn resolve(raw: &RawIntent) -> Result<Self> {
        let kind = IntentKind::from_key(raw.kind.trim())
            .ok_or_else(|| CopilotError::UnknownIntent(raw.kind.clone()))?;
        let single = present(&raw.month);
        let start = present(&raw.period_start);
        let end = present(&raw.period_end);
        let entity = present(&raw.entity).map(String::from);

        let period = match single {
            Some(m) => Period::single(m),
            None => Period::new(start, end),
        };
        let scope = Scope { period, entity };

        let intent = match kind {
            IntentKind::RevenueVsBudget => Self::RevenueVsBudget(scope),
            IntentKind::GrossMarginPct => Self::GrossMarginPct(scope),
            IntentKind::OpexBreakdown => {
                let month = single.or(end).or(start).ok_or(CopilotError::MissingMonth)?;
                Self::OpexBreakdown {
                    month: month.to_string(),
                    entity: scope.entity,
                }
            }
            IntentKind::EbitdaProxy => Self::EbitdaProxy(scope),
            IntentKind::CashRunway => Self::CashRunway(scope),
        };
        debug!(kind = kind.key(), scope = %intent.describe_scope(), "resolved intent");
        Ok(intent)
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            Self::RevenueVsBudget(_) => IntentKind::RevenueVsBudget,
            Self::GrossMarginPct(_) => IntentKind::GrossMarginPct,
            Self::OpexBreakdown { .. } => IntentKind::OpexBreakdown,
            Self::EbitdaProxy(_) => IntentKind::EbitdaProxy,
            Self::CashRunway(_) => IntentKind::CashRunway,
        }
    }

    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::OpexBreakdown { entity, .. } => entity.as_deref(),
            Self::RevenueVsBudget(s)
            | Self::GrossMarginPct(s)
            | Self::EbitdaProxy(s)
            | Self::CashRunway(s) => s.entity.as_deref(),
        }
    }

    /// e.g. `ParentCo, Jan 2025 to Jun 2025`
    pub fn describe_scope(&self) -> String {
        let period = match self {
            Self::OpexBreakdown { month, .. } => month::label(month),
            Self::RevenueVsBudget(s)
            | Self::GrossMarginPct(s)
            | Self::EbitdaProxy(s)
            | Self::CashRunway(s) => s.period.describe(),
        };
        match self.entity() {
            Some(e) => format!("{e}, {period}"),
            None => period,
        }
    }
}

/// JSON schema an external classifier must satisfy.
pub fn intent_schema() -> serde_json::Value {
    let kinds: Vec<&str> = ALL_KINDS.iter().map(IntentKind::key).collect();
    let month_field = |description: &str| {
        json!({
            "type": ["string", "null"],
            "pattern": MONTH_PATTERN,
            "description": description,
        })
    };
    json!({
        "name": "FinanceIntent",
        "schema": {
            "type": "object",
            "properties": {
                "kind": {
                    "type": "string",
                    "enum": kinds,
                    "description": "Which KPI to compute."
                },
                "period_start": month_field("YYYY-MM start month (inclusive)."),
                "period_end": month_field("YYYY-MM end month (inclusive)."),
                "month": month_field("YYYY-MM for single-month views (e.g., Opex breakdown)."),
                "entity": {
                    "type": ["string", "null"],
                    "description": "Optional entity/business unit filter. Case-insensitive match on 'entity' column."
                }
            },
            "required": ["kind"],
            "additionalProperties": false
        }
    })
}
