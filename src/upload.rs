use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;
use crate::loader::{load_ledger, SourceFormat};
use crate::presentation::{Overview, UploadResponse};
use crate::settings::Settings;

/// Uploaded bytes parked on disk under a name unique to this request.
/// The file is removed when the value is dropped, whichever way the request
/// ends.
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `bytes` to a fresh temp file that keeps the extension of
    /// `file_name`, since the workbook reader dispatches on it.
    pub fn stage(file_name: &str, bytes: &[u8]) -> Result<Self> {
        let original = Path::new(file_name);
        SourceFormat::from_path(original)?;
        let ext = original
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut file = tempfile::Builder::new()
            .prefix("ledgerlens-upload-")
            .suffix(&format!(".{ext}"))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        debug!(path = %file.path().display(), size = bytes.len(), "staged upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Full pipeline for one uploaded file: stage, load, aggregate, clean up.
pub fn process_upload(file_name: &str, bytes: &[u8], settings: &Settings) -> Result<UploadResponse> {
    let staged = StagedUpload::stage(file_name, bytes)?;
    let ledger = load_ledger(staged.path(), settings)?;
    Ok(Overview::from_ledger(ledger).into())
}
