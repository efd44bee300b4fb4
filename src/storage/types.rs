use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Drift-detection state of one endpoint.
///
/// Persisted as the value of a JSON object keyed by endpoint name, so the
/// name itself is not part of the serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(skip)]
    pub endpoint_name: String,
    pub fingerprint: String,
    pub last_checked_at: DateTime<Utc>,
    pub source_path: String,
}
