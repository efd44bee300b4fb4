use std::path::{Path, PathBuf};

use log::{error, info};

use crate::data_capture::types::RunReport;
use crate::error_handling::types::StorageError;
use crate::storage::cache_store::write_atomically;

/// Fixed location holding the report of the latest capture run.
///
/// Each save overwrites the previous report; history is not kept.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, report: &RunReport) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        write_atomically(&self.path, json.as_bytes())?;
        info!("[{}] Report saved: {}", report.run_id, self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<RunReport, StorageError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read report {}: {}", self.path.display(), e);
            StorageError::ReadFailed(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| StorageError::Corrupted(format!("{}: {}", self.path.display(), e)))
    }
}
