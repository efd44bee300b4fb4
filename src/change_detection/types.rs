use chrono::{DateTime, Utc};
use serde::Serialize;

/// Drift of one endpoint found during a detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub endpoint_name: String,
    pub source_path: String,
    pub old_fingerprint: String,
    pub new_fingerprint: String,
    pub detected_at: DateTime<Utc>,
}
