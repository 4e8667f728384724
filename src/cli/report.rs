use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::load_overview;
use crate::error::{LedgerError, Result};
use crate::fmt::money;
use crate::presentation::{
    expense_rows, result_rows, revenue_rows, Overview, UploadResponse, EXPENSE_HEADER,
    RESULT_HEADER, REVENUE_HEADER,
};
use crate::settings::load_settings;

// ---------------------------------------------------------------------------
// Command entry points
// ---------------------------------------------------------------------------

pub fn revenue(file: &str) -> Result<()> {
    let settings = load_settings()?;
    let overview = load_overview(file, &settings)?;
    println!("{}", format_revenue(&overview, &settings.currency_symbol));
    Ok(())
}

pub fn expenses(file: &str) -> Result<()> {
    let settings = load_settings()?;
    let overview = load_overview(file, &settings)?;
    println!("{}", format_expenses(&overview, &settings.currency_symbol));
    Ok(())
}

pub fn result(file: &str) -> Result<()> {
    let settings = load_settings()?;
    let overview = load_overview(file, &settings)?;
    println!("{}", format_result(&overview, &settings.currency_symbol));
    Ok(())
}

pub fn json(file: &str) -> Result<()> {
    let settings = load_settings()?;
    let overview = load_overview(file, &settings)?;
    let body = UploadResponse::from(overview);
    let text = serde_json::to_string_pretty(&body).map_err(|e| LedgerError::Other(e.to_string()))?;
    println!("{text}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting functions (overview → String)
// ---------------------------------------------------------------------------

pub fn format_revenue(overview: &Overview, symbol: &str) -> String {
    let mut table = Table::new();
    table.set_header(REVENUE_HEADER.to_vec());
    for [month, amount] in revenue_rows(&overview.report.revenue, symbol) {
        table.add_row(vec![Cell::new(month), Cell::new(amount)]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(symbol, overview.summary.total_revenue)),
    ]);
    format!("Gross Revenue by Month\n{table}")
}

pub fn format_expenses(overview: &Overview, symbol: &str) -> String {
    let mut table = Table::new();
    table.set_header(EXPENSE_HEADER.to_vec());
    for [month, category, amount] in expense_rows(&overview.report.expenses, symbol) {
        table.add_row(vec![Cell::new(month), Cell::new(category), Cell::new(amount)]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(money(symbol, overview.summary.total_expenses)),
    ]);
    let mut monthly = Table::new();
    monthly.set_header(vec!["Month", "Total Expenses"]);
    for (bucket, total) in &overview.report.expense_totals {
        monthly.add_row(vec![Cell::new(bucket.label()), Cell::new(money(symbol, *total))]);
    }
    format!("Expenses by Category\n{table}\n{monthly}")
}

pub fn format_result(overview: &Overview, symbol: &str) -> String {
    let mut table = Table::new();
    table.set_header(RESULT_HEADER.to_vec());
    let rows = result_rows(&overview.report.result, symbol);
    for (r, [month, inflow, outflow, net]) in overview.report.result.iter().zip(rows) {
        let net = if r.net.is_sign_negative() && !r.net.is_zero() {
            net.red().to_string()
        } else {
            net.green().to_string()
        };
        table.add_row(vec![
            Cell::new(month),
            Cell::new(inflow),
            Cell::new(outflow),
            Cell::new(net),
        ]);
    }

    let s = &overview.summary;
    let net_label = if s.net.is_sign_negative() && !s.net.is_zero() {
        "Final Result".red().bold()
    } else {
        "Final Result".green().bold()
    };
    let mut totals = Table::new();
    totals.add_row(vec![Cell::new("Total Revenue"), Cell::new(money(symbol, s.total_revenue))]);
    totals.add_row(vec![Cell::new("Total Expenses"), Cell::new(money(symbol, s.total_expenses))]);
    totals.add_row(vec![Cell::new(net_label), Cell::new(money(symbol, s.net))]);

    format!("Financial Result\n{table}\n{totals}")
}
