//! In-memory page driver for unit tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::driver::{ArtifactMeta, PageDriver};
use crate::configuration::types::WaitCondition;
use crate::error_handling::types::DriverError;

#[derive(Default)]
pub(crate) struct ScriptState {
    pub pages: HashMap<String, Vec<u8>>,
    /// Urls whose next N navigations fail.
    pub flaky: HashMap<String, u32>,
    pub missing_selectors: HashSet<String>,
    pub broken_captures: HashSet<String>,
    pub navigations: Vec<String>,
    pub screenshots: Vec<(String, bool)>,
    pub current: Option<String>,
    pub closed: bool,
}

/// Cloneable handle; clones share the same script and call log.
#[derive(Clone, Default)]
pub(crate) struct ScriptedDriver {
    pub state: Arc<Mutex<ScriptState>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.set_page(url, body);
        self
    }

    pub fn set_page(&self, url: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), body.as_bytes().to_vec());
    }

    pub fn fail_next(&self, url: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .flaky
            .insert(url.to_string(), times);
    }

    pub fn break_capture(&self, url: &str) {
        self.state
            .lock()
            .unwrap()
            .broken_captures
            .insert(url.to_string());
    }

    pub fn hide_selector(&self, selector: &str) {
        self.state
            .lock()
            .unwrap()
            .missing_selectors
            .insert(selector.to_string());
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .navigations
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn navigation_count(&self) -> usize {
        self.state.lock().unwrap().navigations.len()
    }

    pub fn screenshots(&self) -> Vec<(String, bool)> {
        self.state.lock().unwrap().screenshots.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(
        &mut self,
        url: &str,
        _wait: &WaitCondition,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.current = None;
        if let Some(remaining) = state.flaky.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::Navigation(format!("{}: connection reset", url)));
            }
        }
        if !state.pages.contains_key(url) {
            return Err(DriverError::Navigation(format!("{}: 404", url)));
        }
        state.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let state = self.state.lock().unwrap();
        if state.current.is_none() {
            return Err(DriverError::NoPage);
        }
        if state.missing_selectors.contains(selector) {
            return Err(DriverError::Timeout(format!(
                "`{}` not found within {:?}",
                selector, timeout
            )));
        }
        Ok(())
    }

    async fn content(&mut self) -> Result<Vec<u8>, DriverError> {
        let state = self.state.lock().unwrap();
        let url = state.current.as_ref().ok_or(DriverError::NoPage)?;
        state.pages.get(url).cloned().ok_or(DriverError::NoPage)
    }

    async fn screenshot(
        &mut self,
        path: &Path,
        full_page: bool,
    ) -> Result<ArtifactMeta, DriverError> {
        let mut state = self.state.lock().unwrap();
        let url = state.current.clone().ok_or(DriverError::NoPage)?;
        if state.broken_captures.contains(&url) {
            return Err(DriverError::Capture(format!("{}: renderer crashed", url)));
        }
        let body = state.pages.get(&url).cloned().unwrap_or_default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &body)?;
        state.screenshots.push((url, full_page));
        Ok(ArtifactMeta {
            path: path.to_path_buf(),
            size_bytes: body.len() as u64,
        })
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
