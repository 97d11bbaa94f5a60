use serde_json::Value;
use tracing::info;

use crate::error::{CopilotError, Result};
use crate::intent::{Intent, IntentKind, RawIntent};
use crate::kpi::{
    self, CashRunway, EbitdaRow, GrossMarginRow, OpexCategoryRow, RevenueVsBudgetRow,
};
use crate::store::DataStore;

/// Output of one KPI query. Each variant carries that KPI's fixed row shape.
#[derive(Debug, Clone, PartialEq)]
pub enum KpiResult {
    RevenueVsBudget(Vec<RevenueVsBudgetRow>),
    GrossMarginPct(Vec<GrossMarginRow>),
    OpexBreakdown(Vec<OpexCategoryRow>),
    EbitdaProxy(Vec<EbitdaRow>),
    CashRunway(CashRunway),
}

impl KpiResult {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::RevenueVsBudget(_) => IntentKind::RevenueVsBudget,
            Self::GrossMarginPct(_) => IntentKind::GrossMarginPct,
            Self::OpexBreakdown(_) => IntentKind::OpexBreakdown,
            Self::EbitdaProxy(_) => IntentKind::EbitdaProxy,
            Self::CashRunway(_) => IntentKind::CashRunway,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::RevenueVsBudget(rows) => rows.len(),
            Self::GrossMarginPct(rows) => rows.len(),
            Self::OpexBreakdown(rows) => rows.len(),
            Self::EbitdaProxy(rows) => rows.len(),
            Self::CashRunway(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows as JSON objects keyed by column name.
    pub fn records(&self) -> Result<Vec<Value>> {
        fn to_values<T: serde::Serialize>(rows: &[T]) -> Result<Vec<Value>> {
            rows.iter()
                .map(|r| serde_json::to_value(r).map_err(CopilotError::from))
                .collect()
        }
        match self {
            Self::RevenueVsBudget(rows) => to_values(rows),
            Self::GrossMarginPct(rows) => to_values(rows),
            Self::OpexBreakdown(rows) => to_values(rows),
            Self::EbitdaProxy(rows) => to_values(rows),
            Self::CashRunway(row) => to_values(std::slice::from_ref(row)),
        }
    }
}

/// Run the aggregator an intent names.
pub fn execute(data: &DataStore, intent: &Intent) -> KpiResult {
    let result = match intent {
        Intent::RevenueVsBudget(s) => {
            KpiResult::RevenueVsBudget(kpi::revenue_vs_budget(data, &s.period, s.entity.as_deref()))
        }
        Intent::GrossMarginPct(s) => {
            KpiResult::GrossMarginPct(kpi::gross_margin_pct(data, &s.period, s.entity.as_deref()))
        }
        Intent::OpexBreakdown { month, entity } => {
            KpiResult::OpexBreakdown(kpi::opex_breakdown(data, month, entity.as_deref()))
        }
        Intent::EbitdaProxy(s) => {
            KpiResult::EbitdaProxy(kpi::ebitda_proxy(data, &s.period, s.entity.as_deref()))
        }
        Intent::CashRunway(s) => {
            KpiResult::CashRunway(kpi::cash_runway(data, &s.period, s.entity.as_deref()))
        }
    };
    info!(
        kind = intent.kind().key(),
        scope = %intent.describe_scope(),
        rows = result.len(),
        "executed intent"
    );
    result
}

/// Resolve a classifier record and run it.
pub fn execute_raw(data: &DataStore, raw: &RawIntent) -> Result<KpiResult> {
    let intent = Intent::resolve(raw)?;
    Ok(execute(data, &intent))
}
