use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{CopilotError, Result};
use crate::models::{ActualRecord, BudgetRecord, CashRecord, FxRate, LedgerRecord};
use crate::month;

pub const ACTUALS_FILE: &str = "actuals_m.csv";
pub const BUDGET_FILE: &str = "budget_m.csv";
pub const CASH_FILE: &str = "cash_m.csv";
pub const FX_FILE: &str = "fx_m.csv";

const LEDGER_COLUMNS: &[&str] = &["month", "entity", "account_category", "amount_usd"];
const CASH_COLUMNS: &[&str] = &["month", "entity", "cash_usd"];
const FX_COLUMNS: &[&str] = &["month", "currency", "rate_to_usd"];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a numeric cell. Blank or garbage cells count as zero.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    let (digits, sign) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (inner.trim(), -1.0),
        None => (s, 1.0),
    };
    digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map_or(0.0, |v| sign * v)
}

/// Read `path` and project each record onto `required`, in that order.
fn read_table(path: &Path, table: &str, required: &[&str]) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let idx = required
        .iter()
        .map(|col| {
            headers
                .iter()
                .position(|h| h == *col)
                .ok_or_else(|| CopilotError::MissingColumn {
                    table: table.to_string(),
                    column: col.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(
            idx.iter()
                .map(|&i| record.get(i).unwrap_or("").to_string())
                .collect(),
        );
    }
    debug!(table, rows = rows.len(), "read table");
    Ok(rows)
}

fn ledger_rows(path: &Path, table: &str) -> Result<Vec<LedgerRecord>> {
    read_table(path, table, LEDGER_COLUMNS)?
        .into_iter()
        .map(|r| {
            Ok(LedgerRecord {
                month: month::normalize(&r[0])?,
                entity: r[1].clone(),
                account_category: r[2].clone(),
                amount_usd: parse_amount(&r[3]),
            })
        })
        .collect()
}

fn cash_rows(path: &Path) -> Result<Vec<CashRecord>> {
    read_table(path, "cash", CASH_COLUMNS)?
        .into_iter()
        .map(|r| {
            Ok(CashRecord {
                month: month::normalize(&r[0])?,
                entity: r[1].clone(),
                cash_usd: parse_amount(&r[2]),
            })
        })
        .collect()
}

fn fx_rows(path: &Path) -> Result<Vec<FxRate>> {
    read_table(path, "fx", FX_COLUMNS)?
        .into_iter()
        .map(|r| {
            Ok(FxRate {
                month: month::normalize(&r[0])?,
                currency: r[1].clone(),
                rate_to_usd: parse_amount(&r[2]),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DataStore
// ---------------------------------------------------------------------------

/// Normalized monthly tables. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    actuals: Vec<ActualRecord>,
    budget: Vec<BudgetRecord>,
    cash: Vec<CashRecord>,
    fx: Vec<FxRate>,
}

pub struct TableSummary {
    pub name: &'static str,
    pub rows: usize,
    pub first_month: Option<String>,
    pub last_month: Option<String>,
}

impl DataStore {
    pub fn new(
        actuals: Vec<ActualRecord>,
        budget: Vec<BudgetRecord>,
        cash: Vec<CashRecord>,
        fx: Vec<FxRate>,
    ) -> Self {
        Self {
            actuals,
            budget,
            cash,
            fx,
        }
    }

    /// Load the normalized CSV exports from `dir`. The FX table is optional.
    pub fn load(dir: &Path) -> Result<Self> {
        let actuals = ledger_rows(&dir.join(ACTUALS_FILE), "actuals")?;
        let budget = ledger_rows(&dir.join(BUDGET_FILE), "budget")?;
        let cash = cash_rows(&dir.join(CASH_FILE))?;
        let fx_path = dir.join(FX_FILE);
        let fx = if fx_path.exists() {
            fx_rows(&fx_path)?
        } else {
            Vec::new()
        };
        info!(
            dir = %dir.display(),
            actuals = actuals.len(),
            budget = budget.len(),
            cash = cash.len(),
            fx = fx.len(),
            "loaded data store"
        );
        Ok(Self::new(actuals, budget, cash, fx))
    }

    pub fn actuals(&self) -> &[ActualRecord] {
        &self.actuals
    }

    pub fn budget(&self) -> &[BudgetRecord] {
        &self.budget
    }

    pub fn cash(&self) -> &[CashRecord] {
        &self.cash
    }

    pub fn fx(&self) -> &[FxRate] {
        &self.fx
    }

    /// Distinct entity names across actuals, budget and cash, sorted.
    pub fn entities(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .actuals
            .iter()
            .chain(&self.budget)
            .map(|r| r.entity.as_str())
            .chain(self.cash.iter().map(|r| r.entity.as_str()))
            .filter(|e| !e.is_empty())
            .collect();
        names.into_iter().map(String::from).collect()
    }

    pub fn summary(&self) -> Vec<TableSummary> {
        fn span<'a>(name: &'static str, months: impl Iterator<Item = &'a str>) -> TableSummary {
            let all: BTreeSet<&str> = months.collect();
            TableSummary {
                name,
                rows: 0,
                first_month: all.first().map(|m| m.to_string()),
                last_month: all.last().map(|m| m.to_string()),
            }
        }
        vec![
            TableSummary {
                rows: self.actuals.len(),
                ..span("actuals", self.actuals.iter().map(|r| r.month.as_str()))
            },
            TableSummary {
                rows: self.budget.len(),
                ..span("budget", self.budget.iter().map(|r| r.month.as_str()))
            },
            TableSummary {
                rows: self.cash.len(),
                ..span("cash", self.cash.iter().map(|r| r.month.as_str()))
            },
            TableSummary {
                rows: self.fx.len(),
                ..span("fx", self.fx.iter().map(|r| r.month.as_str()))
            },
        ]
    }
}
