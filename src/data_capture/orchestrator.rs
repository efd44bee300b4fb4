//! Capture run orchestration.
//!
//! `CaptureOrchestrator` walks an ordered list of [`CaptureFlow`]s against one
//! shared [`PageDriver`] session and turns each flow into a [`CaptureResult`]:
//!
//! - navigation honours the flow's wait condition and timeout; selector waits
//!   run right after navigation
//! - any failure of a required flow is retried up to `max_retries` times with
//!   a fixed delay, then recorded as `Failed`
//! - an optional flow whose navigation fails is skipped at once; other
//!   failures of an optional flow are retried and end as `Skipped`
//! - a failed flow never stops the run
//!
//! The resulting [`RunReport`] is written to the configured report location,
//! replacing the previous one.
//!
//! Minimal usage
//! ```no_run
//! use std::time::Duration;
//! use snapwatch::configuration::catalogue::default_flows;
//! use snapwatch::data_capture::{CaptureOrchestrator, RetryPolicy};
//! use snapwatch::page_driver::ChromiumDriver;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut driver = ChromiumDriver::launch("chromium").await?;
//! let orchestrator = CaptureOrchestrator::new(
//!     "https://localhost",
//!     "./figures",
//!     RetryPolicy { max_retries: 2, retry_delay: Duration::from_secs(2) },
//! );
//! let report = orchestrator.run(&mut driver, &default_flows()).await?;
//! println!("{}/{} captured", report.succeeded, report.total);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use uuid::Uuid;

use super::backup::backup_existing_artifacts;
use super::types::{CaptureResult, FlowOutcome, RunReport};
use crate::configuration::types::{validate_flows, CaptureFlow, WaitCondition};
use crate::error_handling::types::{CaptureError, DriverError};
use crate::page_driver::{ArtifactMeta, PageDriver};
use crate::storage::report_store::ReportStore;

/// Per-flow retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts granted after the first one.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Stage at which one attempt of a flow failed.
#[derive(Debug)]
enum AttemptFailure {
    Navigation(DriverError),
    ContentWait(DriverError),
    Capture(DriverError),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Navigation(e) => write!(f, "navigation: {}", e),
            AttemptFailure::ContentWait(e) => write!(f, "content wait: {}", e),
            AttemptFailure::Capture(e) => write!(f, "capture: {}", e),
        }
    }
}

pub struct CaptureOrchestrator {
    base_url: String,
    output_dir: PathBuf,
    retry: RetryPolicy,
    reports: Option<ReportStore>,
    backup_dir: Option<PathBuf>,
}

impl CaptureOrchestrator {
    pub fn new<P: AsRef<Path>>(base_url: &str, output_dir: P, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.to_string(),
            output_dir: output_dir.as_ref().to_path_buf(),
            retry,
            reports: None,
            backup_dir: None,
        }
    }

    /// Persist every run report through `store`.
    pub fn with_report_store(mut self, store: ReportStore) -> Self {
        self.reports = Some(store);
        self
    }

    /// Back up existing artifacts under `dir` before each run.
    pub fn with_backup_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.backup_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Captures every flow, in order.
    ///
    /// Only an invalid flow list is an error; individual flow failures end up
    /// in the report.
    pub async fn run(
        &self,
        driver: &mut dyn PageDriver,
        flows: &[CaptureFlow],
    ) -> Result<RunReport, CaptureError> {
        self.run_scoped(driver, flows, "all").await
    }

    /// Captures the flows of one category.
    pub async fn run_category(
        &self,
        driver: &mut dyn PageDriver,
        flows: &[CaptureFlow],
        category: &str,
    ) -> Result<RunReport, CaptureError> {
        let selected: Vec<CaptureFlow> = flows
            .iter()
            .filter(|f| f.category == category)
            .cloned()
            .collect();
        self.run_scoped(driver, &selected, category).await
    }

    async fn run_scoped(
        &self,
        driver: &mut dyn PageDriver,
        flows: &[CaptureFlow],
        scope: &str,
    ) -> Result<RunReport, CaptureError> {
        validate_flows(flows)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        if let Some(ref backup_dir) = self.backup_dir {
            if let Err(e) = backup_existing_artifacts(&self.output_dir, backup_dir) {
                warn!("[{}] Backup of existing artifacts failed: {}", run_id, e);
            }
        }

        info!(
            "[{}] Starting capture: {} flow(s), category {}",
            run_id,
            flows.len(),
            scope
        );
        let mut captures = Vec::with_capacity(flows.len());
        for flow in flows {
            let result = self.capture_flow(run_id, driver, flow).await;
            captures.push(FlowOutcome {
                name: flow.name.clone(),
                filename: flow.output_filename.clone(),
                category: flow.category.clone(),
                result,
            });
        }

        let report = RunReport::new(run_id, started_at, &self.base_url, scope, captures);
        info!(
            "[{}] Capture summary: succeeded {}/{}, skipped {}/{}",
            run_id, report.succeeded, report.total, report.skipped, report.total
        );
        if report.failed > 0 {
            warn!("[{}] Failed: {}/{}", run_id, report.failed, report.total);
        }

        if let Some(ref store) = self.reports {
            if let Err(e) = store.save(&report) {
                error!("[{}] Could not write run report: {}", run_id, e);
            }
        }
        Ok(report)
    }

    async fn capture_flow(
        &self,
        run_id: Uuid,
        driver: &mut dyn PageDriver,
        flow: &CaptureFlow,
    ) -> CaptureResult {
        info!("[{}] Capturing: {}", run_id, flow.name);
        let max_attempts = self.retry.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let failure = match self.attempt(driver, flow).await {
                Ok(meta) => {
                    info!(
                        "[{}]   Saved: {} ({:.2} MB)",
                        run_id,
                        flow.output_filename,
                        meta.size_bytes as f64 / (1024.0 * 1024.0)
                    );
                    return CaptureResult::Success {
                        artifact_path: meta.path,
                        size_bytes: meta.size_bytes,
                    };
                }
                Err(AttemptFailure::Navigation(e)) if flow.optional => {
                    warn!("[{}]   Skipped (page not reachable): {}", run_id, flow.name);
                    return CaptureResult::Skipped {
                        reason: e.to_string(),
                    };
                }
                Err(failure) => failure,
            };

            if attempt < max_attempts {
                warn!(
                    "[{}]   Retry {}/{}: {}",
                    run_id, attempt, self.retry.max_retries, failure
                );
                tokio::time::sleep(self.retry.retry_delay).await;
                continue;
            }

            return if flow.optional {
                warn!(
                    "[{}]   Skipped after {} attempt(s): {}",
                    run_id, attempt, flow.name
                );
                CaptureResult::Skipped {
                    reason: failure.to_string(),
                }
            } else {
                error!(
                    "[{}]   Failed after {} attempt(s): {}: {}",
                    run_id, attempt, flow.name, failure
                );
                CaptureResult::Failed {
                    error: failure.to_string(),
                }
            };
        }
    }

    async fn attempt(
        &self,
        driver: &mut dyn PageDriver,
        flow: &CaptureFlow,
    ) -> Result<ArtifactMeta, AttemptFailure> {
        let timeout = Duration::from_millis(flow.timeout_ms);
        let url = flow.resolve_target(&self.base_url);

        driver
            .navigate(&url, &flow.wait_condition, timeout)
            .await
            .map_err(AttemptFailure::Navigation)?;
        if let WaitCondition::Selector(ref selector) = flow.wait_condition {
            driver
                .wait_for_selector(selector, timeout)
                .await
                .map_err(AttemptFailure::ContentWait)?;
        }

        tokio::time::sleep(Duration::from_millis(flow.post_delay_ms)).await;

        let path = self.output_dir.join(&flow.output_filename);
        driver
            .screenshot(&path, flow.full_page)
            .await
            .map_err(AttemptFailure::Capture)
    }
}
