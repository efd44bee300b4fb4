use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::configuration::types::WaitCondition;
use crate::error_handling::types::DriverError;

/// Metadata of an artifact written by [`PageDriver::screenshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Capabilities the pipeline needs from a browser session.
///
/// One driver instance is one session. It is lent by `&mut` to whichever
/// component is active, so at most one of them talks to the browser at a time.
///
/// `navigate` honours [`WaitCondition::NetworkIdle`] and [`WaitCondition::None`]
/// itself; for [`WaitCondition::Selector`] it only waits for the load and the
/// caller follows up with [`PageDriver::wait_for_selector`].
#[async_trait]
pub trait PageDriver: Send {
    async fn navigate(
        &mut self,
        url: &str,
        wait: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Serialized document of the current page.
    async fn content(&mut self) -> Result<Vec<u8>, DriverError>;

    async fn screenshot(&mut self, path: &Path, full_page: bool)
        -> Result<ArtifactMeta, DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}
