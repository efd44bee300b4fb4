use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use log::info;

use super::catalogue::default_catalogue;
use super::types::FlowCatalogue;
use crate::error_handling::types::ConfigError;

/// Upper bound for `--max-retries`.
pub const MAX_RETRIES_LIMIT: u32 = 100;

/// Runtime configuration of the pipeline.
///
/// Every field is a command-line flag with an environment fallback, so the
/// service can be driven either way. Paths left unset are derived from
/// `output_dir` the way the capture tooling lays out its documentation tree:
///
/// ```text
/// documentation/project-report/
/// ├── figures/            <- output_dir
/// ├── figures_backup/     <- backup_dir
/// ├── capture_log.json    <- report_file
/// └── .ui_cache.json      <- cache_file
/// ```
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Base address of the monitored application
    #[arg(long, env = "BASE_URL", default_value = "https://localhost")]
    pub base_url: String,

    /// Seconds to sleep between two monitoring cycles
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = 300)]
    pub check_interval_secs: u64,

    /// Consecutive failed health checks before the monitor stops
    #[arg(long, env = "MAX_HEALTH_FAILURES", default_value_t = 3)]
    pub max_health_failures: u32,

    /// Extra attempts granted to a failing capture flow
    #[arg(long, env = "MAX_RETRIES", default_value_t = 2)]
    pub max_retries: u32,

    /// Pause between two attempts of the same flow, in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value_t = 2000)]
    pub retry_delay_ms: u64,

    /// Timeout of the reachability probe, in seconds
    #[arg(long, env = "HEALTH_TIMEOUT_SECS", default_value_t = 10)]
    pub health_timeout_secs: u64,

    /// Timeout of one endpoint fetch during change detection, in milliseconds
    #[arg(long, env = "FETCH_TIMEOUT_MS", default_value_t = 15000)]
    pub fetch_timeout_ms: u64,

    /// Directory receiving the captured artifacts
    #[arg(
        long,
        env = "SCREENSHOTS_DIR",
        default_value = "./documentation/project-report/figures"
    )]
    pub output_dir: PathBuf,

    /// Fingerprint cache document
    #[arg(long, env = "UI_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,

    /// Report of the most recent capture run
    #[arg(long, env = "CAPTURE_LOG_FILE")]
    pub report_file: Option<PathBuf>,

    /// Root directory for backups of previous artifacts
    #[arg(long, env = "BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Do not back up existing artifacts before a capture run
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_backup: bool,

    /// TOML file with `[[flows]]` and `[[endpoints]]`; the built-in catalogue is used otherwise
    #[arg(long, env = "FLOWS_FILE")]
    pub flows_file: Option<PathBuf>,

    /// Post-capture batch script, run before committing
    #[arg(long, env = "BATCH_UPDATE_SCRIPT")]
    pub batch_script: Option<PathBuf>,

    /// Repository in which new artifacts are committed
    #[arg(long, env = "REPO_ROOT", default_value = ".")]
    pub repo_root: PathBuf,

    /// Headless browser binary
    #[arg(long, env = "CHROMIUM_BIN", default_value = "chromium")]
    pub browser: String,
}

impl Config {
    /// Checks value ranges that clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::BadUrl(format!(
                "base URL must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.max_health_failures == 0 {
            return Err(ConfigError::NotInRange(
                "max_health_failures must be at least 1".to_string(),
            ));
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::NotInRange(
                "check_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::NotInRange(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES_LIMIT, self.max_retries
            )));
        }
        if self.fetch_timeout_ms == 0 || self.health_timeout_secs == 0 {
            return Err(ConfigError::NotInRange(
                "timeouts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the flows file if one is configured, the built-in catalogue otherwise.
    pub fn load_catalogue(&self) -> Result<FlowCatalogue, ConfigError> {
        let mut catalogue = match &self.flows_file {
            Some(path) => Self::catalogue_from_file(path)?,
            None => default_catalogue(),
        };
        if catalogue.endpoints.is_empty() {
            catalogue.endpoints = default_catalogue().endpoints;
        }
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn catalogue_from_file(path: &Path) -> Result<FlowCatalogue, ConfigError> {
        info!("Loading capture flows from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let catalogue: FlowCatalogue = toml::from_str(&raw)?;
        Ok(catalogue)
    }

    fn report_root(&self) -> PathBuf {
        self.output_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| self.report_root().join(".ui_cache.json"))
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_file
            .clone()
            .unwrap_or_else(|| self.report_root().join("capture_log.json"))
    }

    /// `None` when backups are disabled.
    pub fn backup_path(&self) -> Option<PathBuf> {
        if self.no_backup {
            return None;
        }
        Some(
            self.backup_dir
                .clone()
                .unwrap_or_else(|| self.report_root().join("figures_backup")),
        )
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
