//! Reachability probe for the monitored application.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error_handling::types::HealthError;

/// Status codes that count as "up": the landing page or a redirect to login.
pub const HEALTHY_STATUS_CODES: [u16; 3] = [200, 301, 302];

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns the status code when the target is reachable, an error
    /// otherwise.
    async fn check(&self) -> Result<u16, HealthError>;
}

/// Single GET against the base URL.
///
/// Redirects are reported, not followed, and certificate errors are ignored
/// since the monitored deployment serves a self-signed certificate.
pub struct HttpHealthProbe {
    client: Client,
    url: String,
}

impl HttpHealthProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, HealthError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(|e| HealthError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self) -> Result<u16, HealthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| HealthError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        debug!("Health probe {} answered {}", self.url, status);
        if HEALTHY_STATUS_CODES.contains(&status) {
            Ok(status)
        } else {
            Err(HealthError::UnexpectedStatus(status))
        }
    }
}
