use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::{money, months, pct};
use crate::intent::Intent;
use crate::kpi::{CashRunway, EbitdaRow, GrossMarginRow, OpexCategoryRow, RevenueVsBudgetRow};
use crate::router::KpiResult;

fn signed(val: f64) -> String {
    if val >= 0.0 {
        money(val).green().to_string()
    } else {
        money(val).red().to_string()
    }
}

/// Title line plus the KPI table.
pub fn format_result(intent: &Intent, result: &KpiResult) -> String {
    let title = format!("{} ({})", intent.kind().title(), intent.describe_scope());
    if result.is_empty() {
        return format!("{title}\nNo rows matched.");
    }
    let table = match result {
        KpiResult::RevenueVsBudget(rows) => format_revenue_vs_budget(rows),
        KpiResult::GrossMarginPct(rows) => format_gross_margin(rows),
        KpiResult::OpexBreakdown(rows) => format_opex(rows),
        KpiResult::EbitdaProxy(rows) => format_ebitda(rows),
        KpiResult::CashRunway(r) => format_runway(r),
    };
    format!("{title}\n{table}")
}

pub fn format_revenue_vs_budget(rows: &[RevenueVsBudgetRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Actual", "Budget", "Variance"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.month),
            Cell::new(money(r.revenue_actual_usd)),
            Cell::new(money(r.revenue_budget_usd)),
            Cell::new(signed(r.variance_usd)),
        ]);
    }
    if rows.len() > 1 {
        table.add_row(vec![
            Cell::new("Total".bold()),
            Cell::new(money(rows.iter().map(|r| r.revenue_actual_usd).sum())),
            Cell::new(money(rows.iter().map(|r| r.revenue_budget_usd).sum())),
            Cell::new(signed(rows.iter().map(|r| r.variance_usd).sum())),
        ]);
    }
    table
}

pub fn format_gross_margin(rows: &[GrossMarginRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Revenue", "COGS", "Gross Margin %"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.month),
            Cell::new(money(r.revenue_usd)),
            Cell::new(money(r.cogs_usd)),
            Cell::new(pct(r.gross_margin_pct)),
        ]);
    }
    table
}

pub fn format_opex(rows: &[OpexCategoryRow]) -> Table {
    let total: f64 = rows.iter().map(|r| r.amount_usd).sum();
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%"]);
    for r in rows {
        let share = if total != 0.0 { r.amount_usd / total } else { 0.0 };
        table.add_row(vec![
            Cell::new(&r.category),
            Cell::new(money(r.amount_usd)),
            Cell::new(pct(share)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total)),
        Cell::new(""),
    ]);
    table
}

pub fn format_ebitda(rows: &[EbitdaRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Revenue", "COGS", "Opex", "EBITDA (proxy)"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.month),
            Cell::new(money(r.revenue_usd)),
            Cell::new(money(r.cogs_usd)),
            Cell::new(money(r.opex_total_usd)),
            Cell::new(signed(r.ebitda_proxy_usd)),
        ]);
    }
    table
}

pub fn format_runway(r: &CashRunway) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Runway (months)"),
        Cell::new(months(r.runway_months)),
    ]);
    table.add_row(vec![
        Cell::new("Latest cash"),
        Cell::new(money(r.latest_cash_usd)),
    ]);
    table.add_row(vec![
        Cell::new("Avg burn (last 3m)"),
        Cell::new(money(r.avg_burn_last3m_usd)),
    ]);
    table.add_row(vec![
        Cell::new("Avg buffer (last 3m)"),
        Cell::new(money(r.avg_buffer_last3m_usd)),
    ]);
    table.add_row(vec![
        Cell::new("Burn or buffer"),
        Cell::new(r.burn_or_buffer.as_str()),
    ]);
    table
}
