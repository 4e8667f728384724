use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::models::{Ledger, SkippedRow, TransactionRow};
use crate::settings::{ColumnNames, Settings};

// ---------------------------------------------------------------------------
// Cells: one shape for both workbook and CSV sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Excel serial date (days since 1899-12-30).
    Serial(f64),
    Invalid(String),
}

impl Cell {
    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn header_text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim_start_matches('\u{feff}').trim().to_string(),
            Cell::Number(n) | Cell::Serial(n) => n.to_string(),
            Cell::Invalid(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<&calamine::Data> for Cell {
    fn from(data: &calamine::Data) -> Self {
        use calamine::Data;
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::DateTime(dt) => Cell::Serial(dt.as_f64()),
            Data::Bool(b) => Cell::Invalid(b.to_string()),
            Data::DurationIso(s) => Cell::Invalid(s.clone()),
            Data::Error(e) => Cell::Invalid(format!("{e:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

/// Last serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Largest accepted inflow/outflow (10^15). Sums of bounded amounts stay far
/// inside the `Decimal` range for any realistic row count.
const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::TimeDelta::try_days(serial.trunc() as i64)?)
}

pub fn parse_date_text(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in formats {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    // ISO date-times as written by calamine for .ods and some xlsx files
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .ok()
}

/// Parse a text amount: currency symbol, thousands separators and
/// parenthesized negatives are accepted. A trailing comma followed by one or
/// two digits is read as a decimal comma ("1.234,56").
pub fn parse_amount(raw: &str, currency_symbol: &str) -> Option<Decimal> {
    let mut s = raw.replace('"', "");
    if !currency_symbol.is_empty() {
        s = s.replace(currency_symbol, "");
    }
    let s = s.replace('$', "").replace(char::is_whitespace, "");
    if s.is_empty() {
        return Some(Decimal::ZERO);
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return parse_amount(inner, currency_symbol).map(|d| -d);
    }

    let decimal_comma = match (s.rfind(','), s.rfind('.')) {
        (Some(c), dot) => {
            let frac = s.len() - c - 1;
            dot.map_or(true, |d| d < c) && (1..=2).contains(&frac)
        }
        _ => false,
    };
    let normalized = if decimal_comma {
        s.replace('.', "").replace(',', ".")
    } else {
        s.replace(',', "")
    };
    normalized.parse::<Decimal>().ok()
}

fn cell_to_date(cell: &Cell, formats: &[String]) -> Option<NaiveDate> {
    match cell {
        Cell::Serial(f) | Cell::Number(f) => excel_serial_to_date(*f),
        Cell::Text(s) => parse_date_text(s, formats),
        Cell::Empty | Cell::Invalid(_) => None,
    }
}

fn cell_to_amount(cell: &Cell, currency_symbol: &str) -> Option<Decimal> {
    match cell {
        Cell::Empty => Some(Decimal::ZERO),
        Cell::Number(f) => Decimal::from_f64(*f),
        Cell::Text(s) => parse_amount(s, currency_symbol),
        Cell::Serial(_) | Cell::Invalid(_) => None,
    }
}

fn describe(cell: &Cell) -> String {
    match cell {
        Cell::Empty => "empty cell".to_string(),
        Cell::Text(s) => format!("'{}'", s.trim()),
        Cell::Number(f) | Cell::Serial(f) => f.to_string(),
        Cell::Invalid(s) => format!("'{s}'"),
    }
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnIndex {
    date: usize,
    inflow: usize,
    outflow: usize,
    category: usize,
}

fn find_column(header: &[String], aliases: &[String]) -> Result<usize> {
    header
        .iter()
        .position(|h| aliases.iter().any(|a| a.trim().eq_ignore_ascii_case(h)))
        .ok_or_else(|| LedgerError::Schema {
            column: aliases.first().cloned().unwrap_or_default(),
        })
}

fn resolve_columns(header: &[String], names: &ColumnNames) -> Result<ColumnIndex> {
    Ok(ColumnIndex {
        date: find_column(header, &names.date)?,
        inflow: find_column(header, &names.inflow)?,
        outflow: find_column(header, &names.outflow)?,
        category: find_column(header, &names.category)?,
    })
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn build_row(line: usize, cells: &[Cell], idx: &ColumnIndex, settings: &Settings) -> Result<TransactionRow> {
    let get = |i: usize| cells.get(i).unwrap_or(&Cell::Empty);
    let parse_err = |reason: String| LedgerError::Parse { row: line, reason };

    let date_cell = get(idx.date);
    let date = cell_to_date(date_cell, &settings.date_formats)
        .ok_or_else(|| parse_err(format!("invalid date {}", describe(date_cell))))?;

    let amount = |i: usize, what: &str| -> Result<Decimal> {
        let cell = get(i);
        let value = cell_to_amount(cell, &settings.currency_symbol)
            .ok_or_else(|| parse_err(format!("invalid {what} amount {}", describe(cell))))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(parse_err(format!("negative {what} amount {value}")));
        }
        if value > MAX_AMOUNT {
            return Err(parse_err(format!("{what} amount {value} is out of range")));
        }
        Ok(value)
    };
    let inflow = amount(idx.inflow, "inflow")?;
    let outflow = amount(idx.outflow, "outflow")?;

    let category = match get(idx.category) {
        Cell::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
        Cell::Number(n) => n.to_string(),
        _ => settings.uncategorized_label.clone(),
    };

    Ok(TransactionRow::new(date, inflow, outflow, category))
}

/// Turn raw sheet records into a ledger. The first non-blank record is the
/// header. Rows whose date or amounts can't be read are skipped and reported;
/// a missing column fails the whole load.
pub fn parse_records<I>(records: I, settings: &Settings) -> Result<Ledger>
where
    I: IntoIterator<Item = Vec<Cell>>,
{
    let mut records = records
        .into_iter()
        .enumerate()
        .map(|(i, cells)| (i + 1, cells))
        .filter(|(_, cells)| !cells.iter().all(Cell::is_blank));

    let Some((header_line, header_cells)) = records.next() else {
        return Err(LedgerError::EmptySheet("no rows found".to_string()));
    };
    let header: Vec<String> = header_cells.iter().map(Cell::header_text).collect();
    let idx = resolve_columns(&header, &settings.columns)?;
    debug!(header_line, ?idx, "resolved columns");

    let mut ledger = Ledger::default();
    for (line, cells) in records {
        match build_row(line, &cells, &idx, settings) {
            Ok(row) => ledger.rows.push(row),
            Err(LedgerError::Parse { row, reason }) => {
                warn!(row, %reason, "skipping row");
                ledger.skipped.push(SkippedRow { row, reason });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(ledger)
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    Workbook,
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "ods" => Ok(Self::Workbook),
            "csv" => Ok(Self::Csv),
            _ => Err(LedgerError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn read_workbook(path: &Path, settings: &Settings) -> Result<Vec<Vec<Cell>>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = match &settings.sheet {
        Some(name) => workbook.worksheet_range(name)?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LedgerError::EmptySheet("workbook has no sheets".to_string()))??,
    };
    Ok(range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect())
}

fn read_csv(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(|f| Cell::Text(f.to_string())).collect());
    }
    Ok(records)
}

/// Read a transaction spreadsheet into canonical rows. Does not modify the
/// source file.
pub fn load_ledger(path: &Path, settings: &Settings) -> Result<Ledger> {
    let records = match SourceFormat::from_path(path)? {
        SourceFormat::Workbook => read_workbook(path, settings)?,
        SourceFormat::Csv => read_csv(path)?,
    };
    let ledger = parse_records(records, settings)?;
    info!(
        file = %path.display(),
        rows = ledger.rows.len(),
        skipped = ledger.skipped.len(),
        "loaded ledger"
    );
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_rows(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
        rows.iter()
            .map(|r| r.iter().map(|s| Cell::Text(s.to_string())).collect())
            .collect()
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56", "R$"), Some(d("1234.56")));
        assert_eq!(parse_amount("\"500.00\"", "R$"), Some(d("500")));
        assert_eq!(parse_amount("  42.50  ", "R$"), Some(d("42.5")));
        assert_eq!(parse_amount("", "R$"), Some(Decimal::ZERO));
        assert_eq!(parse_amount("not_a_number", "R$"), None);
    }

    #[test]
    fn test_parse_amount_currency_and_decimal_comma() {
        assert_eq!(parse_amount("R$ 1.234,56", "R$"), Some(d("1234.56")));
        assert_eq!(parse_amount("$1,234.56", "R$"), Some(d("1234.56")));
        assert_eq!(parse_amount("10,5", "R$"), Some(d("10.5")));
        assert_eq!(parse_amount("1,234", "R$"), Some(d("1234")));
    }

    #[test]
    fn test_parse_amount_parenthesized_negatives() {
        assert_eq!(parse_amount("(500.00)", "R$"), Some(d("-500")));
        assert_eq!(parse_amount("(1,234.56)", "R$"), Some(d("-1234.56")));
    }

    #[test]
    fn test_parse_date_text() {
        let formats = Settings::default().date_formats;
        let jan15 = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date_text("2024-01-15", &formats), jan15);
        assert_eq!(parse_date_text("15/01/2024", &formats), jan15);
        assert_eq!(parse_date_text("2024-01-15 10:30:00", &formats), jan15);
        assert_eq!(parse_date_text("2024-01-15T00:00:00", &formats), jan15);
        assert_eq!(parse_date_text("31/02/2024", &formats), None);
        assert_eq!(parse_date_text("soon", &formats), None);
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0), NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(excel_serial_to_date(45667.75), NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(excel_serial_to_date(-3.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(2_958_465.0), NaiveDate::from_ymd_opt(9999, 12, 31));
        assert_eq!(excel_serial_to_date(2_958_466.0), None);
        assert_eq!(excel_serial_to_date(1e12), None);
    }

    #[test]
    fn test_huge_serial_date_cell_is_skipped() {
        let records = vec![
            vec![
                Cell::Text("Data".into()),
                Cell::Text("Entrada".into()),
                Cell::Text("Saida".into()),
                Cell::Text("Nome Natureza".into()),
            ],
            vec![Cell::Number(1e12), Cell::Number(1.0), Cell::Empty, Cell::Text("A".into())],
            vec![Cell::Serial(45306.0), Cell::Number(2.0), Cell::Empty, Cell::Text("A".into())],
        ];
        let ledger = parse_records(records, &Settings::default()).unwrap();
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.skipped.len(), 1);
        assert_eq!(ledger.skipped[0].row, 2);
        assert!(ledger.skipped[0].reason.contains("invalid date"));
    }

    #[test]
    fn test_oversized_amounts_are_skipped() {
        let records = text_rows(&[
            &["Data", "Entrada", "Saida", "Nome Natureza"],
            &["2024-01-15", "50000000000000000000000000000", "0", "A"],
            &["2024-01-16", "50000000000000000000000000000", "0", "A"],
            &["2024-01-17", "0", "1000000000000001", "B"],
            &["2024-01-18", "1000000000000000", "0", "A"],
        ]);
        let ledger = parse_records(records, &Settings::default()).unwrap();
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].inflow, d("1000000000000000"));
        let lines: Vec<usize> = ledger.skipped.iter().map(|s| s.row).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert!(ledger.skipped[0].reason.contains("out of range"));
        assert!(ledger.skipped[2].reason.contains("outflow"));
    }

    #[test]
    fn test_float_amounts_become_exact_decimals() {
        assert_eq!(cell_to_amount(&Cell::Number(0.1), "R$"), Some(d("0.1")));
        assert_eq!(cell_to_amount(&Cell::Number(1250.0), "R$"), Some(d("1250")));
        assert_eq!(cell_to_amount(&Cell::Empty, "R$"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_parse_records_builds_rows_with_buckets() {
        let records = text_rows(&[
            &["Data", "Entrada", "Saida", "Nome Natureza"],
            &["2024-01-15", "100", "0", "A"],
            &["20/01/2024", "", "30", "B"],
        ]);
        let ledger = parse_records(records, &Settings::default()).unwrap();
        assert_eq!(ledger.rows.len(), 2);
        assert!(ledger.skipped.is_empty());
        assert_eq!(ledger.rows[0].bucket.label(), "1/2024");
        assert_eq!(ledger.rows[1].inflow, Decimal::ZERO);
        assert_eq!(ledger.rows[1].outflow, d("30"));
        assert_eq!(ledger.rows[1].category, "B");
    }

    #[test]
    fn test_header_match_is_case_insensitive_and_order_free() {
        let records = text_rows(&[
            &["  category ", "OUTFLOW", "date", "inflow", "memo"],
            &["Rent", "900", "2024-03-01", "0", "march"],
        ]);
        let ledger = parse_records(records, &Settings::default()).unwrap();
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].category, "Rent");
        assert_eq!(ledger.rows[0].outflow, d("900"));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let records = text_rows(&[
            &["Entrada", "Saida", "Nome Natureza"],
            &["100", "0", "A"],
        ]);
        let err = parse_records(records, &Settings::default()).unwrap_err();
        match err {
            LedgerError::Schema { column } => assert_eq!(column, "Data"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_rows_are_skipped_and_reported() {
        let records = text_rows(&[
            &["Data", "Entrada", "Saida", "Nome Natureza"],
            &["2024-01-15", "100", "0", "A"],
            &["someday", "5", "0", "A"],
            &["2024-01-16", "abc", "0", "A"],
            &["2024-01-17", "-10", "0", "A"],
            &["", "", "", ""],
            &["2024-02-01", "50", "0", "A"],
        ]);
        let ledger = parse_records(records, &Settings::default()).unwrap();
        assert_eq!(ledger.rows.len(), 2);
        let lines: Vec<usize> = ledger.skipped.iter().map(|s| s.row).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(ledger.skipped[0].reason.contains("invalid date"));
        assert!(ledger.skipped[1].reason.contains("inflow"));
        assert!(ledger.skipped[2].reason.contains("negative"));
    }

    #[test]
    fn test_empty_category_gets_uncategorized_label() {
        let records = text_rows(&[
            &["Data", "Entrada", "Saida", "Nome Natureza"],
            &["2024-01-15", "0", "12", "  "],
        ]);
        let ledger = parse_records(records, &Settings::default()).unwrap();
        assert_eq!(ledger.rows[0].category, "Uncategorized");
    }

    #[test]
    fn test_workbook_cells_serial_dates_and_numbers() {
        let records = vec![
            vec![
                Cell::Text("Data".into()),
                Cell::Text("Entrada".into()),
                Cell::Text("Saida".into()),
                Cell::Text("Nome Natureza".into()),
            ],
            vec![Cell::Serial(45667.0), Cell::Number(99.9), Cell::Empty, Cell::Text("A".into())],
            vec![Cell::Invalid("true".into()), Cell::Number(1.0), Cell::Empty, Cell::Text("A".into())],
        ];
        let ledger = parse_records(records, &Settings::default()).unwrap();
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].bucket.label(), "1/2025");
        assert_eq!(ledger.rows[0].inflow, d("99.9"));
        assert_eq!(ledger.skipped.len(), 1);
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let err = parse_records(Vec::new(), &Settings::default()).unwrap_err();
        assert!(matches!(err, LedgerError::EmptySheet(_)));
    }

    #[test]
    fn test_load_ledger_from_csv_leaves_source_intact() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Data,Entrada,Saida,Nome Natureza\n2024-01-15,100,0,A\n2024-01-20,0,30,B\n";
        let path = write_csv(dir.path(), "ledger.csv", content);
        let ledger = load_ledger(&path, &Settings::default()).unwrap();
        assert_eq!(ledger.rows.len(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_load_ledger_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "ledger.txt", "Data\n");
        assert!(matches!(
            load_ledger(&path, &Settings::default()),
            Err(LedgerError::UnsupportedFormat(_))
        ));
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[test]
    fn test_load_ledger_from_workbook_first_sheet() {
        let ledger = load_ledger(&fixture("ledger.xlsx"), &Settings::default()).unwrap();
        assert!(ledger.skipped.is_empty());
        let rows: Vec<(String, NaiveDate, Decimal, Decimal, &str)> = ledger
            .rows
            .iter()
            .map(|r| (r.bucket.label(), r.date, r.inflow, r.outflow, r.category.as_str()))
            .collect();
        let date = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        assert_eq!(
            rows,
            vec![
                ("1/2024".to_string(), date(1, 15), d("100"), Decimal::ZERO, "A"),
                ("1/2024".to_string(), date(1, 20), Decimal::ZERO, d("30"), "B"),
                ("2/2024".to_string(), date(2, 1), d("50"), Decimal::ZERO, "A"),
            ]
        );
    }

    #[test]
    fn test_load_ledger_from_named_sheet() {
        let settings = Settings {
            sheet: Some("Arquivo".to_string()),
            ..Settings::default()
        };
        let ledger = load_ledger(&fixture("ledger.xlsx"), &settings).unwrap();
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].bucket.label(), "12/2023");
        assert_eq!(ledger.rows[0].inflow, d("10"));
        assert_eq!(ledger.rows[0].outflow, d("4"));
        assert_eq!(ledger.rows[0].category, "C");
    }

    #[test]
    fn test_load_ledger_unknown_sheet_is_workbook_error() {
        let settings = Settings {
            sheet: Some("Missing".to_string()),
            ..Settings::default()
        };
        assert!(matches!(
            load_ledger(&fixture("ledger.xlsx"), &settings),
            Err(LedgerError::Workbook(_))
        ));
    }

    #[test]
    fn test_load_ledger_garbage_workbook_is_workbook_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "ledger.xlsx", "definitely not a zip archive");
        assert!(matches!(
            load_ledger(&path, &Settings::default()),
            Err(LedgerError::Workbook(_))
        ));
    }
}
