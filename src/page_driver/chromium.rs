use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, trace, warn};
use tokio::process::Command;
use tokio::time::Instant;

use super::driver::{ArtifactMeta, PageDriver};
use super::selector::SelectorProbe;
use crate::configuration::types::WaitCondition;
use crate::error_handling::types::DriverError;

const VIEWPORT_WIDTH: u32 = 1920;
const VIEWPORT_HEIGHT: u32 = 1080;
/// Window height used for full-page captures; the CLI cannot scroll-stitch.
const FULL_PAGE_HEIGHT: u32 = 4320;
// `screenshot` loads the URL again in a fresh process. A selector that
// matched in the dumped DOM and the caller's post-load delay do not carry
// over to that load; only the network-idle virtual time budget does.
/// Upper bound of virtual time granted to a page to settle its network.
const NETWORK_IDLE_BUDGET_MS: u64 = 5_000;
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct LoadedPage {
    url: String,
    wait: WaitCondition,
    timeout: Duration,
    dom: Vec<u8>,
}

/// Page driver backed by a headless Chromium binary.
///
/// Every operation is one short-lived browser process: `--dump-dom` for
/// navigation and content, `--screenshot` for captures. Processes are killed
/// when their timeout elapses.
pub struct ChromiumDriver {
    browser: String,
    page: Option<LoadedPage>,
    closed: bool,
}

impl ChromiumDriver {
    /// Creates a driver and checks that `browser` can be executed.
    pub async fn launch(browser: &str) -> Result<Self, DriverError> {
        info!("Launching headless browser `{}`", browser);
        let output = Command::new(browser)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DriverError::BrowserUnavailable(format!("{}: {}", browser, e)))?;
        if !output.status.success() {
            return Err(DriverError::BrowserUnavailable(format!(
                "`{} --version` exited with {}",
                browser, output.status
            )));
        }
        debug!(
            "Browser version: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(Self {
            browser: browser.to_string(),
            page: None,
            closed: false,
        })
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.browser);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--hide-scrollbars")
            .arg("--ignore-certificate-errors")
            .arg("--disable-blink-features=AutomationControlled")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::BrowserUnavailable(
                "session already closed".to_string(),
            ));
        }
        Ok(())
    }

    async fn dump_dom(
        &self,
        url: &str,
        wait: &WaitCondition,
        timeout: Duration,
    ) -> Result<Vec<u8>, DriverError> {
        let mut cmd = self.base_command();
        if *wait == WaitCondition::NetworkIdle {
            let budget = NETWORK_IDLE_BUDGET_MS.min(timeout.as_millis() as u64);
            cmd.arg(format!("--virtual-time-budget={}", budget));
        }
        cmd.arg("--dump-dom").arg(url);

        trace!("Running {:?}", cmd);
        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| {
                DriverError::Navigation(format!("{} did not load within {:?}", url, timeout))
            })?
            .map_err(|e| DriverError::BrowserUnavailable(e.to_string()))?;

        if !output.status.success() {
            return Err(DriverError::Navigation(format!(
                "{}: browser exited with {}: {}",
                url,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(DriverError::Navigation(format!("{}: empty document", url)));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(
        &mut self,
        url: &str,
        wait: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.ensure_open()?;
        debug!("Navigating to {} ({:?}, timeout {:?})", url, wait, timeout);
        self.page = None;
        let dom = self.dump_dom(url, wait, timeout).await?;
        debug!("Loaded {} ({} bytes)", url, dom.len());
        self.page = Some(LoadedPage {
            url: url.to_string(),
            wait: wait.clone(),
            timeout,
            dom,
        });
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.ensure_open()?;
        let probe = SelectorProbe::parse(selector)?;
        let started = Instant::now();
        loop {
            let page = self.page.as_ref().ok_or(DriverError::NoPage)?;
            if probe.matches(&String::from_utf8_lossy(&page.dom)) {
                trace!("Selector `{}` found on {}", selector, page.url);
                return Ok(());
            }

            let elapsed = started.elapsed();
            if elapsed + SELECTOR_POLL_INTERVAL >= timeout {
                return Err(DriverError::Timeout(format!(
                    "selector `{}` not found on {} within {:?}",
                    selector, page.url, timeout
                )));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;

            let (url, wait) = (page.url.clone(), page.wait.clone());
            let remaining = timeout.saturating_sub(started.elapsed());
            match self.dump_dom(&url, &wait, remaining).await {
                Ok(dom) => {
                    if let Some(page) = self.page.as_mut() {
                        page.dom = dom;
                    }
                }
                Err(e) => warn!("Refreshing {} while waiting for `{}`: {}", url, selector, e),
            }
        }
    }

    async fn content(&mut self) -> Result<Vec<u8>, DriverError> {
        self.ensure_open()?;
        self.page
            .as_ref()
            .map(|p| p.dom.clone())
            .ok_or(DriverError::NoPage)
    }

    async fn screenshot(
        &mut self,
        path: &Path,
        full_page: bool,
    ) -> Result<ArtifactMeta, DriverError> {
        self.ensure_open()?;
        let page = self.page.as_ref().ok_or(DriverError::NoPage)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let height = if full_page {
            FULL_PAGE_HEIGHT
        } else {
            VIEWPORT_HEIGHT
        };
        let mut cmd = self.base_command();
        if page.wait == WaitCondition::NetworkIdle {
            let budget = NETWORK_IDLE_BUDGET_MS.min(page.timeout.as_millis() as u64);
            cmd.arg(format!("--virtual-time-budget={}", budget));
        }
        cmd.arg(format!("--window-size={},{}", VIEWPORT_WIDTH, height))
            .arg(format!("--screenshot={}", path.display()))
            .arg(&page.url);

        trace!("Running {:?}", cmd);
        let output = tokio::time::timeout(page.timeout, cmd.output())
            .await
            .map_err(|_| {
                DriverError::Capture(format!(
                    "{} not captured within {:?}",
                    page.url, page.timeout
                ))
            })?
            .map_err(|e| DriverError::BrowserUnavailable(e.to_string()))?;
        if !output.status.success() {
            return Err(DriverError::Capture(format!(
                "browser exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            DriverError::Capture(format!("no artifact at {}: {}", path.display(), e))
        })?;
        Ok(ArtifactMeta {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
        })
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            debug!("Closing browser session");
        }
        self.page = None;
        self.closed = true;
        Ok(())
    }
}
