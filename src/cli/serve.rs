use crate::error::{LedgerError, Result};
use crate::server;
use crate::settings::load_settings;

pub fn run(host: Option<String>, port: Option<u16>) -> Result<()> {
    let settings = load_settings()?;
    let addr = format!(
        "{}:{}",
        host.unwrap_or_else(|| settings.host.clone()),
        port.unwrap_or(settings.port)
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(server::serve(&addr, settings))
        .map_err(|e| LedgerError::Other(format!("server error: {e:#}")))
}
