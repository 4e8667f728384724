use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Missing required column: {column}")]
    Schema { column: String },

    #[error("Row {row}: {reason}")]
    Parse { row: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Unsupported file format: {0} (expected .xlsx, .xls, .xlsb, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("Sheet has no header row: {0}")]
    EmptySheet(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("{0}")]
    Other(String),
}

impl LedgerError {
    /// Whether the caller sent something we can't use, as opposed to a
    /// failure on our side (temp storage, IO).
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Io(_) | Self::Settings(_) | Self::Other(_) => false,
            Self::Csv(e) => !e.is_io_error(),
            Self::Workbook(calamine::Error::Io(_)) => false,
            _ => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
