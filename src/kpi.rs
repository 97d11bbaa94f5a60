use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::filter::{filter, Period};
use crate::models::LedgerRecord;
use crate::store::DataStore;

/// Number of trailing months averaged for the runway burn rate.
pub const BURN_WINDOW: usize = 3;

// ---------------------------------------------------------------------------
// Monthly helpers
// ---------------------------------------------------------------------------

/// Two monthly sums joined on month. Both sides start at zero so a month
/// present on only one side still yields a row.
#[derive(Debug, Default, Clone, Copy)]
struct MonthPair {
    left: f64,
    right: f64,
}

fn join_monthly<'a>(
    left: impl IntoIterator<Item = &'a LedgerRecord>,
    right: impl IntoIterator<Item = &'a LedgerRecord>,
) -> BTreeMap<String, MonthPair> {
    let mut months: BTreeMap<String, MonthPair> = BTreeMap::new();
    for r in left {
        months.entry(r.month.clone()).or_default().left += r.amount_usd;
    }
    for r in right {
        months.entry(r.month.clone()).or_default().right += r.amount_usd;
    }
    months
}

/// Per-month P&L totals. Any actuals row creates its month, even when the
/// category is neither revenue, COGS nor opex.
#[derive(Debug, Default, Clone, Copy)]
struct PnlMonth {
    revenue: f64,
    cogs: f64,
    opex_total: f64,
}

impl PnlMonth {
    fn net_burn(&self) -> f64 {
        self.opex_total + self.cogs - self.revenue
    }
}

fn pnl_by_month(rows: &[&LedgerRecord]) -> BTreeMap<String, PnlMonth> {
    let mut months: BTreeMap<String, PnlMonth> = BTreeMap::new();
    for r in rows {
        let m = months.entry(r.month.clone()).or_default();
        if r.is_revenue() {
            m.revenue += r.amount_usd;
        } else if r.is_cogs() {
            m.cogs += r.amount_usd;
        } else if r.opex_subcategory().is_some() {
            m.opex_total += r.amount_usd;
        }
    }
    months
}

// ---------------------------------------------------------------------------
// Revenue vs Budget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueVsBudgetRow {
    pub month: String,
    pub revenue_actual_usd: f64,
    pub revenue_budget_usd: f64,
    pub variance_usd: f64,
}

pub fn revenue_vs_budget(
    data: &DataStore,
    period: &Period,
    entity: Option<&str>,
) -> Vec<RevenueVsBudgetRow> {
    let actual = filter(data.actuals(), period, entity);
    let budget = filter(data.budget(), period, entity);

    let joined = join_monthly(
        actual.into_iter().filter(|r| r.is_revenue()),
        budget.into_iter().filter(|r| r.is_revenue()),
    );
    let out: Vec<_> = joined
        .into_iter()
        .map(|(month, p)| RevenueVsBudgetRow {
            month,
            revenue_actual_usd: p.left,
            revenue_budget_usd: p.right,
            variance_usd: p.left - p.right,
        })
        .collect();
    debug!(months = out.len(), "revenue_vs_budget");
    out
}

// ---------------------------------------------------------------------------
// Gross Margin %
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrossMarginRow {
    pub month: String,
    pub revenue_usd: f64,
    pub cogs_usd: f64,
    pub gross_margin_pct: f64,
}

/// `(revenue - cogs) / revenue`, or 0.0 when revenue is not positive.
pub fn margin(revenue: f64, cogs: f64) -> f64 {
    if revenue > 0.0 {
        (revenue - cogs) / revenue
    } else {
        0.0
    }
}

pub fn gross_margin_pct(
    data: &DataStore,
    period: &Period,
    entity: Option<&str>,
) -> Vec<GrossMarginRow> {
    let rows = filter(data.actuals(), period, entity);

    let joined = join_monthly(
        rows.iter().copied().filter(|r| r.is_revenue()),
        rows.iter().copied().filter(|r| r.is_cogs()),
    );
    let out: Vec<_> = joined
        .into_iter()
        .map(|(month, p)| GrossMarginRow {
            month,
            revenue_usd: p.left,
            cogs_usd: p.right,
            gross_margin_pct: margin(p.left, p.right),
        })
        .collect();
    debug!(months = out.len(), "gross_margin_pct");
    out
}

// ---------------------------------------------------------------------------
// Opex Breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpexCategoryRow {
    pub category: String,
    pub amount_usd: f64,
}

/// Single-month opex grouped by the name after `Opex:`, largest first.
/// Equal amounts keep alphabetical order.
pub fn opex_breakdown(data: &DataStore, month: &str, entity: Option<&str>) -> Vec<OpexCategoryRow> {
    let rows = filter(data.actuals(), &Period::single(month), entity);

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in &rows {
        if let Some(category) = r.opex_subcategory() {
            *totals.entry(category).or_insert(0.0) += r.amount_usd;
        }
    }
    let mut out: Vec<_> = totals
        .into_iter()
        .map(|(category, amount_usd)| OpexCategoryRow {
            category: category.to_string(),
            amount_usd,
        })
        .collect();
    out.sort_by(|a, b| b.amount_usd.total_cmp(&a.amount_usd));
    debug!(month, categories = out.len(), "opex_breakdown");
    out
}

// ---------------------------------------------------------------------------
// EBITDA (proxy)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EbitdaRow {
    pub month: String,
    pub revenue_usd: f64,
    pub cogs_usd: f64,
    pub opex_total_usd: f64,
    pub ebitda_proxy_usd: f64,
}

/// Revenue - COGS - total opex, per month.
pub fn ebitda_proxy(data: &DataStore, period: &Period, entity: Option<&str>) -> Vec<EbitdaRow> {
    let rows = filter(data.actuals(), period, entity);
    let out: Vec<_> = pnl_by_month(&rows)
        .into_iter()
        .map(|(month, m)| EbitdaRow {
            month,
            revenue_usd: m.revenue,
            cogs_usd: m.cogs,
            opex_total_usd: m.opex_total,
            ebitda_proxy_usd: m.revenue - m.cogs - m.opex_total,
        })
        .collect();
    debug!(months = out.len(), "ebitda_proxy");
    out
}

// ---------------------------------------------------------------------------
// Cash Runway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnOrBuffer {
    Burn,
    Buffer,
}

impl BurnOrBuffer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Burn => "burn",
            Self::Buffer => "buffer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashRunway {
    #[serde(serialize_with = "serialize_months")]
    pub runway_months: f64,
    pub latest_cash_usd: f64,
    pub avg_burn_last3m_usd: f64,
    pub avg_buffer_last3m_usd: f64,
    pub burn_or_buffer: BurnOrBuffer,
}

/// JSON has no infinity; unlimited runway is written as `"inf"`.
fn serialize_months<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        s.serialize_f64(*value)
    } else {
        s.serialize_str("inf")
    }
}

/// Mean of the last `BURN_WINDOW` values, or 0.0 for an empty series.
fn trailing_mean(series: &[f64]) -> f64 {
    let tail = &series[series.len().saturating_sub(BURN_WINDOW)..];
    if tail.is_empty() {
        0.0
    } else {
        tail.iter().sum::<f64>() / tail.len() as f64
    }
}

/// Latest cash / average net burn over the trailing window.
///
/// When the period has a start, latest cash is read from the cash table scoped
/// to the same period and entity; otherwise from the whole cash history for
/// the entity.
pub fn cash_runway(data: &DataStore, period: &Period, entity: Option<&str>) -> CashRunway {
    let rows = filter(data.actuals(), period, entity);
    let net_burn: Vec<f64> = pnl_by_month(&rows).values().map(PnlMonth::net_burn).collect();
    let avg_last3 = trailing_mean(&net_burn);

    let (burn, buffer, burn_or_buffer) = if avg_last3 >= 0.0 {
        (avg_last3, 0.0, BurnOrBuffer::Burn)
    } else {
        (0.0, avg_last3.abs(), BurnOrBuffer::Buffer)
    };

    let cash_scope = if period.start.is_some() {
        period.clone()
    } else {
        Period::default()
    };
    let mut cash = filter(data.cash(), &cash_scope, entity);
    cash.sort_by(|a, b| a.month.cmp(&b.month));
    let latest_cash = cash.last().map_or(0.0, |r| r.cash_usd);

    let runway_months = if burn > 0.0 {
        latest_cash / burn
    } else {
        f64::INFINITY
    };
    debug!(
        months = net_burn.len(),
        avg_last3,
        latest_cash,
        runway_months,
        "cash_runway"
    );

    CashRunway {
        runway_months,
        latest_cash_usd: latest_cash,
        avg_burn_last3m_usd: burn,
        avg_buffer_last3m_usd: buffer,
        burn_or_buffer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CashRecord;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    fn actual(month: &str, entity: &str, category: &str, amount: f64) -> LedgerRecord {
        LedgerRecord::new(month, entity, category, amount)
    }

    fn store(
        actuals: Vec<LedgerRecord>,
        budget: Vec<LedgerRecord>,
        cash: Vec<CashRecord>,
    ) -> DataStore {
        DataStore::new(actuals, budget, cash, Vec::new())
    }

    #[test]
    fn test_revenue_vs_budget_single_month() {
        let data = store(
            vec![actual("2025-06", "ParentCo", "Revenue", 1_014_896.0)],
            vec![actual("2025-06", "ParentCo", "Revenue", 1_072_687.68)],
            vec![],
        );
        let out = revenue_vs_budget(&data, &Period::single("2025-06"), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].month, "2025-06");
        assert_eq!(out[0].revenue_actual_usd, 1_014_896.0);
        assert_eq!(out[0].revenue_budget_usd, 1_072_687.68);
        assert!(close(out[0].variance_usd, -57_791.68));
    }

    #[test]
    fn test_revenue_vs_budget_outer_join_fills_zero() {
        let data = store(
            vec![
                actual("2025-01", "A", "revenue", 100.0),
                actual("2025-01", "B", "REVENUE", 50.0),
                actual("2025-02", "A", "COGS", 10.0),
            ],
            vec![actual("2025-03", "A", "Revenue", 80.0)],
            vec![],
        );
        let out = revenue_vs_budget(&data, &Period::default(), None);
        let months: Vec<_> = out.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["2025-01", "2025-03"]);
        assert_eq!(out[0].revenue_actual_usd, 150.0);
        assert_eq!(out[0].revenue_budget_usd, 0.0);
        assert_eq!(out[0].variance_usd, 150.0);
        assert_eq!(out[1].revenue_actual_usd, 0.0);
        assert_eq!(out[1].variance_usd, -80.0);
    }

    #[test]
    fn test_revenue_vs_budget_empty() {
        let data = store(vec![actual("2025-01", "A", "COGS", 1.0)], vec![], vec![]);
        assert!(revenue_vs_budget(&data, &Period::default(), None).is_empty());
    }

    #[test]
    fn test_gross_margin_zero_revenue() {
        let data = store(
            vec![
                actual("2025-01", "A", "Revenue", 200.0),
                actual("2025-01", "A", "COGS", 50.0),
                actual("2025-02", "A", "COGS", 30.0),
                actual("2025-03", "A", "Opex:Admin", 30.0),
            ],
            vec![],
            vec![],
        );
        let out = gross_margin_pct(&data, &Period::default(), None);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].gross_margin_pct, 0.75);
        assert_eq!(out[1].month, "2025-02");
        assert_eq!(out[1].revenue_usd, 0.0);
        assert_eq!(out[1].cogs_usd, 30.0);
        assert_eq!(out[1].gross_margin_pct, 0.0);
    }

    #[test]
    fn test_gross_margin_matches_any_case() {
        let data = store(
            vec![
                actual("2025-01", "A", "revenue", 100.0),
                actual("2025-01", "A", "cogs", 40.0),
            ],
            vec![],
            vec![],
        );
        let out = gross_margin_pct(&data, &Period::default(), None);
        assert_eq!(out[0].revenue_usd, 100.0);
        assert_eq!(out[0].cogs_usd, 40.0);
        assert!(close(out[0].gross_margin_pct, 0.6));
    }

    #[test]
    fn test_margin_negative_revenue() {
        assert_eq!(margin(-10.0, 5.0), 0.0);
        assert_eq!(margin(0.0, 0.0), 0.0);
    }

    fn opex_fixture() -> DataStore {
        store(
            vec![
                actual("2024-05", "ParentCo", "Opex:Admin", 36_900.0),
                actual("2024-05", "ParentCo", "Opex:Marketing", 123_000.0),
                actual("2024-05", "ParentCo", "Opex:R&D", 49_200.0),
                actual("2024-05", "ParentCo", "Opex:Sales", 73_800.0),
                actual("2024-05", "ParentCo", "Revenue", 900_000.0),
                actual("2024-05", "EMEA", "Opex:Marketing", 11_000.0),
                actual("2024-06", "ParentCo", "Opex:Marketing", 99.0),
            ],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_opex_breakdown_sorted_descending() {
        let data = opex_fixture();
        let out = opex_breakdown(&data, "2024-05", Some("parentco"));
        let names: Vec<_> = out.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["Marketing", "Sales", "R&D", "Admin"]);
        let amounts: Vec<_> = out.iter().map(|r| r.amount_usd).collect();
        assert_eq!(amounts, vec![123_000.0, 73_800.0, 49_200.0, 36_900.0]);
    }

    #[test]
    fn test_opex_breakdown_sums_across_entities() {
        let data = opex_fixture();
        let out = opex_breakdown(&data, "2024-05", None);
        assert_eq!(out[0].category, "Marketing");
        assert_eq!(out[0].amount_usd, 134_000.0);
        let total: f64 = out.iter().map(|r| r.amount_usd).sum();
        assert_eq!(total, 134_000.0 + 73_800.0 + 49_200.0 + 36_900.0);
    }

    #[test]
    fn test_opex_breakdown_empty_month() {
        let data = opex_fixture();
        assert!(opex_breakdown(&data, "2023-01", None).is_empty());
    }

    #[test]
    fn test_opex_breakdown_ties_are_alphabetical() {
        let data = store(
            vec![
                actual("2024-05", "A", "Opex:Travel", 10.0),
                actual("2024-05", "A", "opex:Legal", 10.0),
            ],
            vec![],
            vec![],
        );
        let out = opex_breakdown(&data, "2024-05", None);
        assert_eq!(out[0].category, "Legal");
        assert_eq!(out[1].category, "Travel");
    }

    #[test]
    fn test_ebitda_identity() {
        let data = store(
            vec![
                actual("2025-01", "A", "Revenue", 1000.0),
                actual("2025-01", "A", "COGS", 300.0),
                actual("2025-01", "A", "Opex:Sales", 200.0),
                actual("2025-01", "A", "opex:Admin", 100.5),
                actual("2025-02", "A", "Other Income", 5.0),
            ],
            vec![],
            vec![],
        );
        let out = ebitda_proxy(&data, &Period::default(), None);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].opex_total_usd, 300.5);
        assert_eq!(out[0].ebitda_proxy_usd, 399.5);
        assert_eq!(out[1].month, "2025-02");
        assert_eq!(out[1].ebitda_proxy_usd, 0.0);
        for row in &out {
            assert_eq!(
                row.ebitda_proxy_usd,
                row.revenue_usd - row.cogs_usd - row.opex_total_usd
            );
        }
    }

    fn burn_fixture(burns: &[(&str, f64)]) -> Vec<LedgerRecord> {
        burns
            .iter()
            .map(|(m, b)| {
                if *b >= 0.0 {
                    actual(m, "ParentCo", "Opex:Payroll", *b)
                } else {
                    actual(m, "ParentCo", "Revenue", -b)
                }
            })
            .collect()
    }

    #[test]
    fn test_cash_runway_burn() {
        let data = store(
            burn_fixture(&[
                ("2025-01", 99_999.0),
                ("2025-02", 10_000.0),
                ("2025-03", -5_000.0),
                ("2025-04", 20_000.0),
            ]),
            vec![],
            vec![
                CashRecord::new("2025-04", "ParentCo", 250_000.0),
                CashRecord::new("2025-01", "ParentCo", 1.0),
            ],
        );
        let out = cash_runway(&data, &Period::default(), None);
        assert_eq!(out.burn_or_buffer, BurnOrBuffer::Burn);
        assert!(close(out.avg_burn_last3m_usd, 8_333.333_333));
        assert_eq!(out.avg_buffer_last3m_usd, 0.0);
        assert_eq!(out.latest_cash_usd, 250_000.0);
        assert!(close(out.runway_months, 250_000.0 / (25_000.0 / 3.0)));
    }

    #[test]
    fn test_cash_runway_buffer_is_infinite() {
        let data = store(
            burn_fixture(&[("2025-01", -1_000.0), ("2025-02", -2_000.0)]),
            vec![],
            vec![CashRecord::new("2025-02", "ParentCo", 10.0)],
        );
        let out = cash_runway(&data, &Period::default(), None);
        assert_eq!(out.burn_or_buffer, BurnOrBuffer::Buffer);
        assert_eq!(out.avg_burn_last3m_usd, 0.0);
        assert_eq!(out.avg_buffer_last3m_usd, 1_500.0);
        assert_eq!(out.runway_months, f64::INFINITY);
    }

    #[test]
    fn test_cash_runway_no_data() {
        let data = store(vec![], vec![], vec![]);
        let out = cash_runway(&data, &Period::default(), None);
        assert_eq!(out.burn_or_buffer, BurnOrBuffer::Burn);
        assert_eq!(out.avg_burn_last3m_usd, 0.0);
        assert_eq!(out.latest_cash_usd, 0.0);
        assert!(out.runway_months.is_infinite());
    }

    #[test]
    fn test_cash_runway_period_start_scopes_cash() {
        let data = store(
            burn_fixture(&[("2025-01", 1_000.0), ("2025-02", 1_000.0)]),
            vec![],
            vec![
                CashRecord::new("2025-01", "ParentCo", 4_000.0),
                CashRecord::new("2025-02", "ParentCo", 3_000.0),
                CashRecord::new("2025-03", "ParentCo", 2_000.0),
                CashRecord::new("2025-03", "EMEA", 9_000.0),
            ],
        );
        let scoped = cash_runway(
            &data,
            &Period::new(Some("2025-01"), Some("2025-02")),
            Some("ParentCo"),
        );
        assert_eq!(scoped.latest_cash_usd, 3_000.0);
        assert_eq!(scoped.runway_months, 3.0);

        let open = cash_runway(&data, &Period::new(None, Some("2025-02")), Some("ParentCo"));
        assert_eq!(open.latest_cash_usd, 2_000.0);

        let all = cash_runway(&data, &Period::default(), None);
        assert_eq!(all.latest_cash_usd, 9_000.0);
    }

    #[test]
    fn test_cash_runway_serializes_infinity() {
        let data = store(vec![], vec![], vec![]);
        let json = serde_json::to_value(cash_runway(&data, &Period::default(), None)).unwrap();
        assert_eq!(json["runway_months"], "inf");
        assert_eq!(json["burn_or_buffer"], "burn");
    }

    #[test]
    fn test_aggregators_are_idempotent() {
        let data = store(
            vec![
                actual("2025-04", "ParentCo", "Revenue", 90_000.0),
                actual("2025-04", "ParentCo", "COGS", 30_000.0),
                actual("2025-04", "ParentCo", "Opex:Sales", 70_000.0),
                actual("2025-05", "ParentCo", "Revenue", 95_000.0),
                actual("2025-05", "EMEA", "COGS", 12_000.0),
                actual("2025-05", "EMEA", "Opex:Admin", 8_000.0),
                actual("2025-06", "ParentCo", "Revenue", 101_000.0),
                actual("2025-06", "ParentCo", "Opex:Marketing", 64_000.0),
            ],
            vec![
                actual("2025-04", "ParentCo", "Revenue", 88_000.0),
                actual("2025-06", "EMEA", "Revenue", 20_000.0),
            ],
            vec![
                CashRecord::new("2025-04", "ParentCo", 500_000.0),
                CashRecord::new("2025-06", "ParentCo", 480_000.0),
                CashRecord::new("2025-06", "EMEA", 75_000.0),
            ],
        );
        let periods = [
            Period::default(),
            Period::new(Some("2025-05"), None),
            Period::single("2025-06"),
        ];
        for p in &periods {
            for entity in [None, Some("ParentCo"), Some("emea")] {
                assert_eq!(
                    revenue_vs_budget(&data, p, entity),
                    revenue_vs_budget(&data, p, entity)
                );
                assert_eq!(
                    gross_margin_pct(&data, p, entity),
                    gross_margin_pct(&data, p, entity)
                );
                assert_eq!(ebitda_proxy(&data, p, entity), ebitda_proxy(&data, p, entity));
                assert_eq!(cash_runway(&data, p, entity), cash_runway(&data, p, entity));
            }
        }
        for month in ["2025-04", "2025-05", "2025-06"] {
            assert_eq!(
                opex_breakdown(&data, month, None),
                opex_breakdown(&data, month, None)
            );
        }

        let first = serde_json::to_string(&cash_runway(&data, &Period::default(), None)).unwrap();
        let again = serde_json::to_string(&cash_runway(&data, &Period::default(), None)).unwrap();
        assert_eq!(first, again);
    }
}
