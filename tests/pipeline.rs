//! End-to-end run of detector, orchestrator and controller against an
//! in-memory site.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use snapwatch::change_detection::ChangeDetector;
use snapwatch::configuration::types::{CaptureFlow, Endpoint, FlowCatalogue, WaitCondition};
use snapwatch::controller::controller_handler::{Collaborators, Controller, LoopSettings};
use snapwatch::controller::health::HealthProbe;
use snapwatch::controller::side_effects::SideEffectExecutor;
use snapwatch::controller::{ControllerState, CycleOutcome, StopReason};
use snapwatch::data_capture::{CaptureOrchestrator, RetryPolicy, RunReport};
use snapwatch::error_handling::types::{DriverError, ExecutorError, HealthError};
use snapwatch::page_driver::{ArtifactMeta, PageDriver};
use snapwatch::storage::cache_store::FileCacheStore;
use snapwatch::storage::report_store::ReportStore;
use tempfile::TempDir;
use tokio::sync::watch;

const BASE: &str = "https://app.local";

#[derive(Clone, Default)]
struct Site {
    pages: Arc<Mutex<HashMap<String, String>>>,
}

impl Site {
    fn publish(&self, path: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(format!("{}{}", BASE, path), body.to_string());
    }
}

struct SiteDriver {
    site: Site,
    current: Option<String>,
}

#[async_trait]
impl PageDriver for SiteDriver {
    async fn navigate(
        &mut self,
        url: &str,
        _wait: &WaitCondition,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        let pages = self.site.pages.lock().unwrap();
        match pages.get(url) {
            Some(body) => {
                self.current = Some(body.clone());
                Ok(())
            }
            None => {
                self.current = None;
                Err(DriverError::Navigation(format!("{}: 404", url)))
            }
        }
    }

    async fn wait_for_selector(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn content(&mut self) -> Result<Vec<u8>, DriverError> {
        self.current
            .as_ref()
            .map(|body| body.as_bytes().to_vec())
            .ok_or(DriverError::NoPage)
    }

    async fn screenshot(&mut self, path: &Path, _full_page: bool) -> Result<ArtifactMeta, DriverError> {
        let body = self.current.clone().ok_or(DriverError::NoPage)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, body.as_bytes())?;
        Ok(ArtifactMeta {
            path: path.to_path_buf(),
            size_bytes: body.len() as u64,
        })
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

struct AlwaysUp;

#[async_trait]
impl HealthProbe for AlwaysUp {
    async fn check(&self) -> Result<u16, HealthError> {
        Ok(200)
    }
}

#[derive(Clone, Default)]
struct Commits {
    messages: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SideEffectExecutor for Commits {
    async fn run_batch_capture(&self, _mode: &str, _flags: &[String]) -> Result<i32, ExecutorError> {
        Ok(0)
    }

    async fn commit(&self, _paths: &[PathBuf], message: &str) -> Result<(), ExecutorError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn controller(dir: &Path, site: &Site, commits: &Commits, stop: watch::Receiver<bool>) -> Controller {
    let store = FileCacheStore::open(dir.join(".ui_cache.json")).unwrap();
    let parts = Collaborators {
        driver: Box::new(SiteDriver {
            site: site.clone(),
            current: None,
        }),
        detector: ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store)),
        orchestrator: CaptureOrchestrator::new(BASE, dir.join("figures"), RetryPolicy::default())
            .with_report_store(ReportStore::new(dir.join("capture_log.json"))),
        health: Box::new(AlwaysUp),
        executor: Box::new(commits.clone()),
    };
    let catalogue = FlowCatalogue {
        flows: vec![
            CaptureFlow::new("Login page", "/login", "login.png", "auth").with_delay(0),
            CaptureFlow::new("Main menu", "/menu", "menu.png", "gameplay").with_delay(0),
            CaptureFlow::new("Certificate", "/cert-info", "cert.png", "security")
                .optional()
                .with_delay(0),
        ],
        endpoints: vec![Endpoint::new("login", "/login"), Endpoint::new("menu", "/menu")],
    };
    let settings = LoopSettings {
        check_interval: Duration::from_secs(300),
        max_health_failures: 3,
    };
    Controller::with_collaborators(parts, catalogue, settings, stop)
}

fn site() -> Site {
    let site = Site::default();
    site.publish("/login", "<form id=\"login\">v1</form>");
    site.publish("/menu", "<nav>v1</nav>");
    site
}

#[tokio::test(start_paused = true)]
async fn drift_produces_report_and_commit() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let site = site();
    let commits = Commits::default();
    let (_stop, rx) = watch::channel(false);
    let mut controller = controller(dir.path(), &site, &commits, rx);

    assert_eq!(controller.run_cycle().await, CycleOutcome::NoChanges);
    assert!(!dir.path().join("capture_log.json").exists());

    site.publish("/menu", "<nav>v2</nav>");
    let outcome = controller.run_cycle().await;
    assert_eq!(
        outcome,
        CycleOutcome::Captured {
            changes: 1,
            failed_flows: 0,
            committed: true
        }
    );

    let report: RunReport = ReportStore::new(dir.path().join("capture_log.json"))
        .load()
        .unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.category, "all");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("figures").join("menu.png")).unwrap(),
        "<nav>v2</nav>"
    );
    assert_eq!(commits.messages.lock().unwrap().len(), 1);

    let cache: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(".ui_cache.json")).unwrap(),
    )
    .unwrap();
    assert!(cache["login"]["fingerprint"].is_string());
    assert_eq!(cache["menu"]["sourcePath"], "/menu");
}

#[tokio::test(start_paused = true)]
async fn monitoring_loop_captures_once_then_stops() {
    let dir = TempDir::new().unwrap();
    let site = site();
    let commits = Commits::default();
    let (stop, rx) = watch::channel(false);
    let mut controller = controller(dir.path(), &site, &commits, rx);

    let task = tokio::spawn(async move {
        let reason = controller.run().await;
        (reason, controller)
    });

    // first cycle records the baseline, the second one sees the new login page
    tokio::time::sleep(Duration::from_secs(10)).await;
    site.publish("/login", "<form id=\"login\">v2</form>");
    tokio::time::sleep(Duration::from_secs(400)).await;
    stop.send(true).unwrap();

    let (reason, controller) = task.await.unwrap();
    assert_eq!(reason, StopReason::Cancelled);
    let triggered = controller
        .transitions()
        .iter()
        .filter(|t| t.to == ControllerState::Triggering)
        .count();
    assert_eq!(triggered, 1);
    assert_eq!(controller.state(), ControllerState::Stopped);
    assert_eq!(commits.messages.lock().unwrap().len(), 1);
}
