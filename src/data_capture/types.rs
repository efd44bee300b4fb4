//! Common data types used across the data_capture subsystem.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of attempting one capture flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CaptureResult {
    #[serde(rename_all = "camelCase")]
    Success {
        artifact_path: PathBuf,
        size_bytes: u64,
    },
    Skipped { reason: String },
    Failed { error: String },
}

impl CaptureResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CaptureResult::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CaptureResult::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CaptureResult::Failed { .. })
    }
}

/// One line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOutcome {
    pub name: String,
    pub filename: String,
    pub category: String,
    #[serde(flatten)]
    pub result: CaptureResult,
}

/// Aggregate of one orchestrator invocation.
///
/// Counters are computed from `captures` by [`RunReport::new`] and never
/// edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub base_url: String,
    pub category: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub captures: Vec<FlowOutcome>,
}

impl RunReport {
    pub fn new(
        run_id: Uuid,
        timestamp: DateTime<Utc>,
        base_url: &str,
        category: &str,
        captures: Vec<FlowOutcome>,
    ) -> Self {
        let succeeded = captures.iter().filter(|c| c.result.is_success()).count();
        let failed = captures.iter().filter(|c| c.result.is_failed()).count();
        let skipped = captures.iter().filter(|c| c.result.is_skipped()).count();
        Self {
            run_id,
            timestamp,
            base_url: base_url.to_string(),
            category: category.to_string(),
            total: captures.len(),
            succeeded,
            failed,
            skipped,
            captures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, result: CaptureResult) -> FlowOutcome {
        FlowOutcome {
            name: name.to_string(),
            filename: format!("{}.png", name),
            category: "auth".to_string(),
            result,
        }
    }

    #[test]
    fn test_counters_are_derived_from_results() {
        let report = RunReport::new(
            Uuid::new_v4(),
            Utc::now(),
            "https://localhost",
            "all",
            vec![
                outcome(
                    "a",
                    CaptureResult::Success {
                        artifact_path: PathBuf::from("/tmp/a.png"),
                        size_bytes: 10,
                    },
                ),
                outcome(
                    "b",
                    CaptureResult::Skipped {
                        reason: "404".into(),
                    },
                ),
                outcome(
                    "c",
                    CaptureResult::Failed {
                        error: "timeout".into(),
                    },
                ),
                outcome(
                    "d",
                    CaptureResult::Success {
                        artifact_path: PathBuf::from("/tmp/d.png"),
                        size_bytes: 20,
                    },
                ),
            ],
        );
        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            report.succeeded + report.failed + report.skipped,
            report.total
        );
    }

    #[test]
    fn test_report_json_layout() {
        let report = RunReport::new(
            Uuid::new_v4(),
            Utc::now(),
            "https://localhost",
            "all",
            vec![
                outcome(
                    "login",
                    CaptureResult::Success {
                        artifact_path: PathBuf::from("figures/login.png"),
                        size_bytes: 2048,
                    },
                ),
                outcome(
                    "cert",
                    CaptureResult::Skipped {
                        reason: "not found".into(),
                    },
                ),
            ],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["baseUrl"], "https://localhost");
        assert_eq!(json["total"], 2);
        assert_eq!(json["captures"][0]["status"], "success");
        assert_eq!(json["captures"][0]["filename"], "login.png");
        assert_eq!(json["captures"][0]["sizeBytes"], 2048);
        assert_eq!(json["captures"][1]["status"], "skipped");
        assert_eq!(json["captures"][1]["reason"], "not found");

        let back: RunReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
