//! Health-gated monitoring loop.
//!
//! The controller owns the browser session and lends it to the change
//! detector or the capture orchestrator, one at a time. A cycle goes
//! `Idle → HealthChecking → Detecting → (Triggering) → Idle`; an unhealthy
//! target goes through `Backoff` instead, and too many unhealthy checks in a
//! row end the loop in `Stopped`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Utc};
use log::{error, info, warn};
use tokio::sync::watch;

use super::health::{HealthProbe, HttpHealthProbe};
use super::side_effects::{SideEffectExecutor, ShellExecutor};
use super::types::{ControllerState, CycleOutcome, StateTransition, StopReason};
use crate::change_detection::detector::ChangeDetector;
use crate::configuration::config::Config;
use crate::configuration::types::{CaptureFlow, Endpoint, FlowCatalogue};
use crate::data_capture::{CaptureOrchestrator, RetryPolicy};
use crate::error_handling::types::ControllerError;
use crate::page_driver::{ChromiumDriver, PageDriver};
use crate::storage::cache_store::FileCacheStore;
use crate::storage::report_store::ReportStore;

/// Mode handed to the batch script after a clean capture run.
const BATCH_MODE: &str = "all";
const BATCH_FLAGS: [&str; 1] = ["--no-optimize"];

/// Builds the change detector described by `config`, loading its cache.
pub fn build_detector(config: &Config) -> Result<ChangeDetector, ControllerError> {
    let store = FileCacheStore::open(config.cache_path())?;
    Ok(ChangeDetector::new(
        &config.base_url,
        config.fetch_timeout(),
        Box::new(store),
    ))
}

/// Builds the capture orchestrator described by `config`.
pub fn build_orchestrator(config: &Config) -> CaptureOrchestrator {
    let retry = RetryPolicy {
        max_retries: config.max_retries,
        retry_delay: config.retry_delay(),
    };
    let orchestrator = CaptureOrchestrator::new(&config.base_url, &config.output_dir, retry)
        .with_report_store(ReportStore::new(config.report_path()));
    match config.backup_path() {
        Some(dir) => orchestrator.with_backup_dir(dir),
        None => orchestrator,
    }
}

/// Everything the loop talks to.
pub struct Collaborators {
    pub driver: Box<dyn PageDriver>,
    pub detector: ChangeDetector,
    pub orchestrator: CaptureOrchestrator,
    pub health: Box<dyn HealthProbe>,
    pub executor: Box<dyn SideEffectExecutor>,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub check_interval: Duration,
    pub max_health_failures: u32,
}

pub struct Controller {
    driver: Box<dyn PageDriver>,
    detector: ChangeDetector,
    orchestrator: CaptureOrchestrator,
    health: Box<dyn HealthProbe>,
    executor: Box<dyn SideEffectExecutor>,
    endpoints: Vec<Endpoint>,
    flows: Vec<CaptureFlow>,
    settings: LoopSettings,
    consecutive_failures: u32,
    state: ControllerState,
    transitions: Vec<StateTransition>,
    stop: watch::Receiver<bool>,
}

impl Controller {
    /// Wires the production collaborators: Chromium driver, file cache,
    /// HTTP health probe and shell executor.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration or the flows file is invalid,
    /// the cache file is unreadable, or the browser cannot be launched.
    pub async fn new(config: &Config, stop: watch::Receiver<bool>) -> Result<Self, ControllerError> {
        config.validate()?;
        let catalogue = config.load_catalogue()?;
        let detector = build_detector(config)?;
        let orchestrator = build_orchestrator(config);
        let health = HttpHealthProbe::new(&config.base_url, config.health_timeout())?;
        let executor = ShellExecutor::new(config.batch_script.clone(), &config.repo_root);
        let driver = ChromiumDriver::launch(&config.browser).await?;

        info!(
            "Monitoring {} every {}s ({} endpoint(s), {} flow(s))",
            config.base_url,
            config.check_interval_secs,
            catalogue.endpoints.len(),
            catalogue.flows.len()
        );

        Ok(Self::with_collaborators(
            Collaborators {
                driver: Box::new(driver),
                detector,
                orchestrator,
                health: Box::new(health),
                executor: Box::new(executor),
            },
            catalogue,
            LoopSettings {
                check_interval: config.check_interval(),
                max_health_failures: config.max_health_failures,
            },
            stop,
        ))
    }

    pub fn with_collaborators(
        parts: Collaborators,
        catalogue: FlowCatalogue,
        settings: LoopSettings,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            driver: parts.driver,
            detector: parts.detector,
            orchestrator: parts.orchestrator,
            health: parts.health,
            executor: parts.executor,
            endpoints: catalogue.endpoints,
            flows: catalogue.flows,
            settings,
            consecutive_failures: 0,
            state: ControllerState::Idle,
            transitions: Vec::new(),
            stop,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Runs cycles until the stop signal fires or the target stays
    /// unreachable for `max_health_failures` checks in a row.
    ///
    /// The first cycle starts immediately; later ones follow after
    /// `check_interval`, a sleep the stop signal cuts short.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use clap::Parser;
    /// use snapwatch::configuration::config::Config;
    /// use snapwatch::controller::controller_handler::Controller;
    ///
    /// #[derive(Parser)]
    /// struct Cli {
    ///     #[command(flatten)]
    ///     config: Config,
    /// }
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let (_tx, rx) = tokio::sync::watch::channel(false);
    ///     let cli = Cli::parse();
    ///     let mut controller = Controller::new(&cli.config, rx).await.unwrap();
    ///     let reason = controller.run().await;
    ///     println!("stopped: {}", reason);
    /// }
    /// ```
    pub async fn run(&mut self) -> StopReason {
        loop {
            if let CycleOutcome::Stopped(reason) = self.run_cycle().await {
                return reason;
            }
            self.idle().await;
        }
    }

    /// Runs a single cycle starting from `Idle`.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        if self.stop_requested() {
            return self.shutdown(StopReason::Cancelled).await;
        }

        self.transition(ControllerState::HealthChecking);
        match self.health.check().await {
            Ok(status) => {
                info!("Target healthy ({})", status);
                self.consecutive_failures = 0;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    "Target unreachable ({}/{}): {}",
                    self.consecutive_failures, self.settings.max_health_failures, e
                );
                self.transition(ControllerState::Backoff);
                if self.consecutive_failures >= self.settings.max_health_failures {
                    return self
                        .shutdown(StopReason::TargetUnreachable {
                            failures: self.consecutive_failures,
                        })
                        .await;
                }
                self.transition(ControllerState::Idle);
                return CycleOutcome::Unhealthy {
                    consecutive_failures: self.consecutive_failures,
                };
            }
        }

        self.transition(ControllerState::Detecting);
        let changes = self
            .detector
            .check_all(self.driver.as_mut(), &self.endpoints)
            .await;
        if changes.is_empty() {
            info!("No UI changes");
            self.transition(ControllerState::Idle);
            return CycleOutcome::NoChanges;
        }

        info!("{} UI change(s) detected", changes.len());
        for change in &changes {
            info!("  {} ({})", change.endpoint_name, change.source_path);
        }
        self.transition(ControllerState::Triggering);
        let outcome = self.trigger_capture(changes.len()).await;
        self.transition(ControllerState::Idle);
        outcome
    }

    async fn trigger_capture(&mut self, changes: usize) -> CycleOutcome {
        let report = match self
            .orchestrator
            .run(self.driver.as_mut(), &self.flows)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                error!("Capture run rejected: {}", e);
                return CycleOutcome::CaptureRejected { changes };
            }
        };

        let captured = CycleOutcome::Captured {
            changes,
            failed_flows: report.failed,
            committed: false,
        };
        if report.failed > 0 {
            warn!(
                "[{}] {} flow(s) failed, skipping batch update and commit",
                report.run_id, report.failed
            );
            return captured;
        }

        let flags: Vec<String> = BATCH_FLAGS.iter().map(|f| f.to_string()).collect();
        match self.executor.run_batch_capture(BATCH_MODE, &flags).await {
            Ok(0) => {}
            Ok(code) => {
                warn!("Batch capture exited with {}, not committing", code);
                return captured;
            }
            Err(e) => {
                error!("Batch capture failed: {}", e);
                return captured;
            }
        }

        let message = format!(
            "Auto-capture: UI changes detected ({})",
            Local::now().format("%Y-%m-%d %H:%M")
        );
        let paths: Vec<PathBuf> = vec![self.orchestrator.output_dir().to_path_buf()];
        match self.executor.commit(&paths, &message).await {
            Ok(()) => CycleOutcome::Captured {
                changes,
                failed_flows: 0,
                committed: true,
            },
            Err(e) => {
                error!("Commit failed: {}", e);
                captured
            }
        }
    }

    async fn shutdown(&mut self, reason: StopReason) -> CycleOutcome {
        self.transition(ControllerState::Stopped);
        if reason.is_fatal() {
            error!("Stopping: {}", reason);
        } else {
            info!("Stopping: {}", reason);
        }
        if let Err(e) = self.driver.close().await {
            warn!("Failed to close page driver: {}", e);
        }
        CycleOutcome::Stopped(reason)
    }

    /// Sleeps one check interval or until the stop signal fires.
    async fn idle(&mut self) {
        let sleep = tokio::time::sleep(self.settings.check_interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return,
                changed = self.stop.changed() => {
                    if changed.is_err() {
                        // sender gone, nobody can stop us early any more
                        (&mut sleep).await;
                        return;
                    }
                    if *self.stop.borrow() {
                        return;
                    }
                }
            }
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    fn transition(&mut self, to: ControllerState) {
        let at = Utc::now();
        info!("[{}] {} -> {}", at.to_rfc3339(), self.state, to);
        self.transitions.push(StateTransition {
            at,
            from: self.state,
            to,
        });
        self.state = to;
    }
}
