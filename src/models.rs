use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Calendar month used as the grouping key for every aggregate.
///
/// Field order matters: the derived `Ord` compares year first, then month, so
/// buckets sort chronologically. Never sort on the display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    #[allow(dead_code)]
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub date: NaiveDate,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub category: String,
    pub bucket: MonthBucket,
}

impl TransactionRow {
    pub fn new(date: NaiveDate, inflow: Decimal, outflow: Decimal, category: impl Into<String>) -> Self {
        Self {
            date,
            inflow,
            outflow,
            category: category.into(),
            bucket: MonthBucket::from_date(date),
        }
    }
}

/// A source row that was dropped during loading. `row` is 1-based and counts
/// the header, so it matches the line a user sees in their spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// Output of the loader: the canonical rows plus whatever was skipped.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub rows: Vec<TransactionRow>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueMonth {
    pub bucket: MonthBucket,
    pub inflow: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseGroup {
    pub bucket: MonthBucket,
    pub category: String,
    pub outflow: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMonth {
    pub bucket: MonthBucket,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
}
