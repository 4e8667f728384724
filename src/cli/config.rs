use crate::error::{LedgerError, Result};
use crate::settings::{load_settings, save_settings_to, settings_path, Settings};

pub fn show() -> Result<()> {
    let path = settings_path();
    let settings = load_settings()?;
    let json = serde_json::to_string_pretty(&settings)
        .map_err(|e| LedgerError::Settings(e.to_string()))?;
    if path.exists() {
        println!("Settings file: {}", path.display());
    } else {
        println!("Settings file: {} (not created; using defaults)", path.display());
    }
    println!("{json}");
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = settings_path();
    if path.exists() && !force {
        return Err(LedgerError::Settings(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    save_settings_to(&path, &Settings::default())?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
