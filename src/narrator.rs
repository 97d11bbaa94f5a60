use crate::error::Result;
use crate::fmt::{dollars, months, pct};
use crate::intent::Intent;
use crate::kpi::{
    self, BurnOrBuffer, CashRunway, EbitdaRow, GrossMarginRow, OpexCategoryRow, RevenueVsBudgetRow,
};
use crate::month;
use crate::router::KpiResult;

/// Result -> prose. Summaries only restate numbers present in the result.
pub trait Narrator {
    fn narrate(&self, question: &str, intent: &Intent, result: &KpiResult) -> Result<String>;
}

/// Deterministic board-slide summaries: whole dollars, one-decimal percentages.
pub struct TemplateNarrator;

/// How many opex categories are named before the rest are counted.
const OPEX_LISTED: usize = 5;

fn scope_prefix(intent: &Intent) -> String {
    intent
        .entity()
        .map(|e| format!("{e} "))
        .unwrap_or_default()
}

/// Label for the months a monthly result actually covers.
fn covered<'a>(mut iter: impl Iterator<Item = &'a str>) -> String {
    let Some(first) = iter.next() else {
        return String::new();
    };
    let last = iter.last().unwrap_or(first);
    month::span_label(first, last)
}

fn revenue_vs_budget(intent: &Intent, rows: &[RevenueVsBudgetRow]) -> String {
    let period = covered(rows.iter().map(|r| r.month.as_str()));
    let actual: f64 = rows.iter().map(|r| r.revenue_actual_usd).sum();
    let budget: f64 = rows.iter().map(|r| r.revenue_budget_usd).sum();
    let variance: f64 = rows.iter().map(|r| r.variance_usd).sum();
    let mut text = format!(
        "{}revenue for {period} was {} against a budget of {}, a variance of {}",
        scope_prefix(intent),
        dollars(actual),
        dollars(budget),
        dollars(variance),
    );
    if budget != 0.0 {
        text.push_str(&format!(" ({} vs budget)", pct(variance / budget)));
    }
    text.push('.');
    capitalize(&text)
}

fn gross_margin(intent: &Intent, rows: &[GrossMarginRow]) -> String {
    let revenue: f64 = rows.iter().map(|r| r.revenue_usd).sum();
    let cogs: f64 = rows.iter().map(|r| r.cogs_usd).sum();
    let prefix = scope_prefix(intent);
    if let [row] = rows {
        return capitalize(&format!(
            "{prefix}gross margin for {} was {} on revenue of {} and COGS of {}.",
            month::label(&row.month),
            pct(row.gross_margin_pct),
            dollars(row.revenue_usd),
            dollars(row.cogs_usd),
        ));
    }
    let (first, last) = (&rows[0], &rows[rows.len() - 1]);
    capitalize(&format!(
        "{prefix}gross margin moved from {} in {} to {} in {}; across the period it was {} on revenue of {}.",
        pct(first.gross_margin_pct),
        month::label(&first.month),
        pct(last.gross_margin_pct),
        month::label(&last.month),
        pct(kpi::margin(revenue, cogs)),
        dollars(revenue),
    ))
}

fn opex_breakdown(intent: &Intent, rows: &[OpexCategoryRow]) -> String {
    let when = match intent {
        Intent::OpexBreakdown { month: m, .. } => month::label(m),
        _ => String::new(),
    };
    let total: f64 = rows.iter().map(|r| r.amount_usd).sum();
    let listed: Vec<String> = rows
        .iter()
        .take(OPEX_LISTED)
        .map(|r| format!("{} {}", r.category, dollars(r.amount_usd)))
        .collect();
    let mut text = format!(
        "{}opex for {when} totalled {}: {}",
        scope_prefix(intent),
        dollars(total),
        listed.join(", "),
    );
    if rows.len() > OPEX_LISTED {
        text.push_str(&format!(" and {} smaller categories", rows.len() - OPEX_LISTED));
    }
    text.push('.');
    capitalize(&text)
}

fn ebitda(intent: &Intent, rows: &[EbitdaRow]) -> String {
    let period = covered(rows.iter().map(|r| r.month.as_str()));
    let sum = |f: fn(&EbitdaRow) -> f64| rows.iter().map(f).sum::<f64>();
    let mut text = format!(
        "{}EBITDA (proxy) for {period} was {} on revenue of {}, with COGS of {} and opex of {}.",
        scope_prefix(intent),
        dollars(sum(|r| r.ebitda_proxy_usd)),
        dollars(sum(|r| r.revenue_usd)),
        dollars(sum(|r| r.cogs_usd)),
        dollars(sum(|r| r.opex_total_usd)),
    );
    if rows.len() > 1 {
        let last = &rows[rows.len() - 1];
        text.push_str(&format!(
            " {} alone contributed {}.",
            month::label(&last.month),
            dollars(last.ebitda_proxy_usd)
        ));
    }
    capitalize(&text)
}

fn cash_runway(intent: &Intent, r: &CashRunway) -> String {
    let prefix = scope_prefix(intent);
    match r.burn_or_buffer {
        BurnOrBuffer::Burn if r.runway_months.is_finite() => capitalize(&format!(
            "{prefix}cash of {} covers about {} months at the average net burn of {} per month over the last three months.",
            dollars(r.latest_cash_usd),
            months(r.runway_months),
            dollars(r.avg_burn_last3m_usd),
        )),
        BurnOrBuffer::Burn => capitalize(&format!(
            "{prefix}net burn over the last three months averaged {}, so runway is unlimited; latest cash is {}.",
            dollars(r.avg_burn_last3m_usd),
            dollars(r.latest_cash_usd),
        )),
        BurnOrBuffer::Buffer => capitalize(&format!(
            "{prefix}operations generated an average net buffer of {} per month over the last three months, so runway is unlimited; latest cash is {}.",
            dollars(r.avg_buffer_last3m_usd),
            dollars(r.latest_cash_usd),
        )),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Narrator for TemplateNarrator {
    fn narrate(&self, _question: &str, intent: &Intent, result: &KpiResult) -> Result<String> {
        if result.is_empty() {
            return Ok(format!(
                "No {} data matched {}.",
                intent.kind().title(),
                intent.describe_scope()
            ));
        }
        Ok(match result {
            KpiResult::RevenueVsBudget(rows) => revenue_vs_budget(intent, rows),
            KpiResult::GrossMarginPct(rows) => gross_margin(intent, rows),
            KpiResult::OpexBreakdown(rows) => opex_breakdown(intent, rows),
            KpiResult::EbitdaProxy(rows) => ebitda(intent, rows),
            KpiResult::CashRunway(row) => cash_runway(intent, row),
        })
    }
}
