use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Header names accepted for each required column. The first entry of each
/// list is the name reported when the column is missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnNames {
    #[serde(default = "default_date_columns")]
    pub date: Vec<String>,
    #[serde(default = "default_inflow_columns")]
    pub inflow: Vec<String>,
    #[serde(default = "default_outflow_columns")]
    pub outflow: Vec<String>,
    #[serde(default = "default_category_columns")]
    pub category: Vec<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: default_date_columns(),
            inflow: default_inflow_columns(),
            outflow: default_outflow_columns(),
            category: default_category_columns(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_date_columns() -> Vec<String> {
    strings(&["Data", "Date"])
}

fn default_inflow_columns() -> Vec<String> {
    strings(&["Entrada", "Inflow"])
}

fn default_outflow_columns() -> Vec<String> {
    strings(&["Saida", "Saída", "Outflow"])
}

fn default_category_columns() -> Vec<String> {
    strings(&["Nome Natureza", "Categoria", "Category"])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub columns: ColumnNames,
    /// chrono format strings tried in order for text date cells.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    /// Worksheet to read; the first sheet when unset.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_uncategorized_label")]
    pub uncategorized_label: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_date_formats() -> Vec<String> {
    strings(&["%Y-%m-%d", "%d/%m/%Y", "%Y-%m-%d %H:%M:%S"])
}

fn default_uncategorized_label() -> String {
    "Uncategorized".to_string()
}

fn default_currency_symbol() -> String {
    "R$".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            date_formats: default_date_formats(),
            sheet: None,
            uncategorized_label: default_uncategorized_label(),
            currency_symbol: default_currency_symbol(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ledgerlens")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Load settings from the default location. A missing file yields defaults;
/// a malformed one is an error rather than a silent reset.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| LedgerError::Settings(format!("{}: {e}", path.display())))
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| LedgerError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
