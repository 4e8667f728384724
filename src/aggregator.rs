//! Monthly aggregates over loaded transaction rows.
//!
//! Everything here is a pure function of its input. Grouping goes through
//! `BTreeMap`s keyed by [`MonthBucket`], so output order is chronological by
//! construction and repeated runs over the same rows give identical results.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{ExpenseGroup, MonthBucket, ResultMonth, RevenueMonth, TransactionRow};

// ---------------------------------------------------------------------------
// Revenue
// ---------------------------------------------------------------------------

/// Gross revenue per month: summed inflow for every month present in the
/// data, so a month with only expenses shows up with zero revenue.
pub fn revenue_by_month(rows: &[TransactionRow]) -> Vec<RevenueMonth> {
    let mut totals: BTreeMap<MonthBucket, Decimal> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.bucket).or_default() += row.inflow;
    }
    totals
        .into_iter()
        .map(|(bucket, inflow)| RevenueMonth { bucket, inflow })
        .collect()
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

/// Summed outflow per (month, category), ordered by month then category.
/// Groups whose rows carry no outflow at all are left out.
pub fn expenses_by_month_category(rows: &[TransactionRow]) -> Vec<ExpenseGroup> {
    let mut totals: BTreeMap<(MonthBucket, &str), Decimal> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.outflow.is_zero()) {
        *totals.entry((row.bucket, row.category.as_str())).or_default() += row.outflow;
    }
    totals
        .into_iter()
        .map(|((bucket, category), outflow)| ExpenseGroup {
            bucket,
            category: category.to_string(),
            outflow,
        })
        .collect()
}

/// Total outflow per month across all categories.
pub fn expense_totals_by_month(rows: &[TransactionRow]) -> BTreeMap<MonthBucket, Decimal> {
    let mut totals: BTreeMap<MonthBucket, Decimal> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.outflow.is_zero()) {
        *totals.entry(row.bucket).or_default() += row.outflow;
    }
    totals
}

// ---------------------------------------------------------------------------
// Result (P&L)
// ---------------------------------------------------------------------------

/// Inflow, outflow and net for every month present in the data.
pub fn result_by_month(rows: &[TransactionRow]) -> Vec<ResultMonth> {
    let mut totals: BTreeMap<MonthBucket, (Decimal, Decimal)> = BTreeMap::new();
    for row in rows {
        let entry = totals.entry(row.bucket).or_default();
        entry.0 += row.inflow;
        entry.1 += row.outflow;
    }
    totals
        .into_iter()
        .map(|(bucket, (inflow, outflow))| ResultMonth {
            bucket,
            inflow,
            outflow,
            net: inflow - outflow,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// All three at once
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub revenue: Vec<RevenueMonth>,
    pub expenses: Vec<ExpenseGroup>,
    pub result: Vec<ResultMonth>,
    pub expense_totals: BTreeMap<MonthBucket, Decimal>,
}

impl Report {
    pub fn build(rows: &[TransactionRow]) -> Self {
        let report = Self {
            revenue: revenue_by_month(rows),
            expenses: expenses_by_month_category(rows),
            result: result_by_month(rows),
            expense_totals: expense_totals_by_month(rows),
        };
        tracing::debug!(
            months = report.result.len(),
            expense_groups = report.expenses.len(),
            "built report"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn row(date: &str, inflow: &str, outflow: &str, category: &str) -> TransactionRow {
        TransactionRow::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            d(inflow),
            d(outflow),
            category,
        )
    }

    fn scenario() -> Vec<TransactionRow> {
        vec![
            row("2024-01-15", "100", "0", "A"),
            row("2024-01-20", "0", "30", "B"),
            row("2024-02-01", "50", "0", "A"),
        ]
    }

    fn messy() -> Vec<TransactionRow> {
        vec![
            row("2024-10-03", "1200.10", "0", "Sales"),
            row("2024-01-09", "0.10", "0", "Sales"),
            row("2023-12-31", "0.20", "15.35", "Fees"),
            row("2024-03-02", "0", "99.99", "Rent"),
            row("2024-01-28", "0", "0.70", "Fees"),
            row("2024-10-15", "0", "200", "Rent"),
            row("2024-01-02", "0", "0.30", "Fees"),
            row("2024-03-30", "7", "3", "Misc"),
        ]
    }

    #[test]
    fn test_end_to_end_scenario() {
        let rows = scenario();

        let revenue: Vec<(String, Decimal)> = revenue_by_month(&rows)
            .into_iter()
            .map(|r| (r.bucket.label(), r.inflow))
            .collect();
        assert_eq!(
            revenue,
            vec![("1/2024".to_string(), d("100")), ("2/2024".to_string(), d("50"))]
        );

        let expenses = expenses_by_month_category(&rows);
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].bucket.label(), "1/2024");
        assert_eq!(expenses[0].category, "B");
        assert_eq!(expenses[0].outflow, d("30"));

        let result: Vec<(String, Decimal, Decimal, Decimal)> = result_by_month(&rows)
            .into_iter()
            .map(|r| (r.bucket.label(), r.inflow, r.outflow, r.net))
            .collect();
        assert_eq!(
            result,
            vec![
                ("1/2024".to_string(), d("100"), d("30"), d("70")),
                ("2/2024".to_string(), d("50"), d("0"), d("50")),
            ]
        );
    }

    #[test]
    fn test_revenue_conserves_inflow() {
        let rows = messy();
        let total: Decimal = rows.iter().map(|r| r.inflow).sum();
        let aggregated: Decimal = revenue_by_month(&rows).iter().map(|r| r.inflow).sum();
        assert_eq!(aggregated, total);
    }

    #[test]
    fn test_expenses_conserve_outflow() {
        let rows = messy();
        let total: Decimal = rows.iter().map(|r| r.outflow).sum();
        let aggregated: Decimal = expenses_by_month_category(&rows).iter().map(|e| e.outflow).sum();
        assert_eq!(aggregated, total);
    }

    #[test]
    fn test_decimal_sums_are_exact() {
        let rows = vec![
            row("2024-05-01", "0.1", "0", "A"),
            row("2024-05-02", "0.2", "0", "A"),
        ];
        assert_eq!(revenue_by_month(&rows)[0].inflow, d("0.3"));
    }

    #[test]
    fn test_net_matches_revenue_minus_expense_total() {
        let rows = messy();
        let revenue: BTreeMap<MonthBucket, Decimal> = revenue_by_month(&rows)
            .into_iter()
            .map(|r| (r.bucket, r.inflow))
            .collect();
        let expenses = expense_totals_by_month(&rows);
        for month in result_by_month(&rows) {
            if let (Some(rev), Some(exp)) = (revenue.get(&month.bucket), expenses.get(&month.bucket)) {
                assert_eq!(month.net, *rev - *exp, "month {}", month.bucket);
            }
        }
    }

    #[test]
    fn test_chronological_not_lexicographic_order() {
        let rows = vec![
            row("2024-01-05", "1", "1", "A"),
            row("2023-12-05", "1", "1", "A"),
            row("2024-03-05", "1", "1", "A"),
            row("2024-10-05", "1", "1", "A"),
        ];
        let expected = vec!["12/2023", "1/2024", "3/2024", "10/2024"];
        let labels = |buckets: Vec<MonthBucket>| -> Vec<String> {
            buckets.iter().map(|b| b.label()).collect()
        };
        assert_eq!(labels(revenue_by_month(&rows).iter().map(|r| r.bucket).collect()), expected);
        assert_eq!(
            labels(expenses_by_month_category(&rows).iter().map(|e| e.bucket).collect()),
            expected
        );
        assert_eq!(labels(result_by_month(&rows).iter().map(|r| r.bucket).collect()), expected);
    }

    #[test]
    fn test_same_bucket_and_category_add_up() {
        let rows = messy();
        let fees_jan = expenses_by_month_category(&rows)
            .into_iter()
            .find(|e| e.bucket == MonthBucket::new(2024, 1) && e.category == "Fees")
            .unwrap();
        assert_eq!(fees_jan.outflow, d("1.00"));
    }

    #[test]
    fn test_expenses_sorted_by_category_within_month() {
        let rows = vec![
            row("2024-06-01", "0", "5", "Zebra"),
            row("2024-06-02", "0", "5", "Apple"),
        ];
        let cats: Vec<String> = expenses_by_month_category(&rows)
            .into_iter()
            .map(|e| e.category)
            .collect();
        assert_eq!(cats, vec!["Apple", "Zebra"]);
    }

    #[test]
    fn test_expense_only_month_has_zero_revenue() {
        let rows = vec![
            row("2024-01-15", "100", "0", "Sales"),
            row("2024-02-10", "0", "40", "Rent"),
        ];
        let revenue: Vec<(String, Decimal)> = revenue_by_month(&rows)
            .into_iter()
            .map(|r| (r.bucket.label(), r.inflow))
            .collect();
        assert_eq!(
            revenue,
            vec![("1/2024".to_string(), d("100")), ("2/2024".to_string(), Decimal::ZERO)]
        );
        let result = result_by_month(&rows);
        assert_eq!(result.len(), revenue.len());
        assert_eq!(result[1].net, d("-40"));
        let expenses = expenses_by_month_category(&rows);
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].bucket, MonthBucket::new(2024, 2));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let rows = messy();
        assert_eq!(Report::build(&rows), Report::build(&rows));
    }

    #[test]
    fn test_empty_input() {
        let report = Report::build(&[]);
        assert!(report.revenue.is_empty());
        assert!(report.expenses.is_empty());
        assert!(report.result.is_empty());
    }
}
