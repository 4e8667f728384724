//! Chart, table and JSON shapes for the three aggregate views.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregator::Report;
use crate::fmt::money;
use crate::models::{ExpenseGroup, Ledger, MonthBucket, ResultMonth, RevenueMonth, SkippedRow};

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net: Decimal,
}

impl Summary {
    pub fn from_results(results: &[ResultMonth]) -> Self {
        let total_revenue: Decimal = results.iter().map(|r| r.inflow).sum();
        let total_expenses: Decimal = results.iter().map(|r| r.outflow).sum();
        Self {
            total_revenue,
            total_expenses,
            net: total_revenue - total_expenses,
        }
    }
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

pub fn revenue_series(revenue: &[RevenueMonth]) -> Vec<(String, Decimal)> {
    revenue.iter().map(|r| (r.bucket.label(), r.inflow)).collect()
}

pub fn result_series(result: &[ResultMonth]) -> Vec<(String, Decimal)> {
    result.iter().map(|r| (r.bucket.label(), r.net)).collect()
}

/// One line of the expense trend chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub category: String,
    /// One value per entry of [`ExpensePivot::months`], zero where the
    /// category had no expense that month.
    pub values: Vec<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpensePivot {
    pub months: Vec<MonthBucket>,
    pub series: Vec<CategorySeries>,
}

/// Month × category grid of expenses, categories in name order.
pub fn expense_pivot(expenses: &[ExpenseGroup]) -> ExpensePivot {
    let months: Vec<MonthBucket> = expenses
        .iter()
        .map(|e| e.bucket)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let col: BTreeMap<MonthBucket, usize> =
        months.iter().enumerate().map(|(i, m)| (*m, i)).collect();

    let mut by_category: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
    for e in expenses {
        let values = by_category
            .entry(e.category.as_str())
            .or_insert_with(|| vec![Decimal::ZERO; months.len()]);
        if let Some(&i) = col.get(&e.bucket) {
            values[i] += e.outflow;
        }
    }

    ExpensePivot {
        months,
        series: by_category
            .into_iter()
            .map(|(category, values)| CategorySeries {
                category: category.to_string(),
                values,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Table rows (formatted)
// ---------------------------------------------------------------------------

pub const REVENUE_HEADER: [&str; 2] = ["Month", "Revenue"];
pub const EXPENSE_HEADER: [&str; 3] = ["Month", "Category", "Expense"];
pub const RESULT_HEADER: [&str; 4] = ["Month", "Revenue", "Expenses", "Profit/Loss"];

pub fn revenue_rows(revenue: &[RevenueMonth], symbol: &str) -> Vec<[String; 2]> {
    revenue
        .iter()
        .map(|r| [r.bucket.label(), money(symbol, r.inflow)])
        .collect()
}

pub fn expense_rows(expenses: &[ExpenseGroup], symbol: &str) -> Vec<[String; 3]> {
    expenses
        .iter()
        .map(|e| [e.bucket.label(), e.category.clone(), money(symbol, e.outflow)])
        .collect()
}

pub fn result_rows(result: &[ResultMonth], symbol: &str) -> Vec<[String; 4]> {
    result
        .iter()
        .map(|r| {
            [
                r.bucket.label(),
                money(symbol, r.inflow),
                money(symbol, r.outflow),
                money(symbol, r.net),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Everything a surface needs, built once per input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Overview {
    pub report: Report,
    pub summary: Summary,
    pub pivot: ExpensePivot,
    pub skipped: Vec<SkippedRow>,
}

impl Overview {
    /// Consumes the ledger; the source rows are not needed once the
    /// aggregates exist.
    pub fn from_ledger(ledger: Ledger) -> Self {
        let report = Report::build(&ledger.rows);
        let summary = Summary::from_results(&report.result);
        let pivot = expense_pivot(&report.expenses);
        Self {
            report,
            summary,
            pivot,
            skipped: ledger.skipped,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub revenue: Vec<RevenueMonth>,
    pub expenses: Vec<ExpenseGroup>,
    pub skipped: Vec<SkippedRow>,
}

impl From<Overview> for UploadResponse {
    fn from(overview: Overview) -> Self {
        Self {
            revenue: overview.report.revenue,
            expenses: overview.report.expenses,
            skipped: overview.skipped,
        }
    }
}
