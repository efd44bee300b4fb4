use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error_handling::types::ConfigError;

/// What a navigation has to wait for before the page counts as loaded.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    /// No network activity for a short while after load.
    #[default]
    NetworkIdle,
    /// The document contains an element matching the CSS selector.
    Selector(String),
    /// Plain load completion, nothing more.
    None,
}

/// Declarative description of one artifact to produce.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CaptureFlow {
    pub name: String,
    /// Absolute URL, or a path resolved against the base URL.
    pub target: String,
    #[serde(default, rename = "wait")]
    pub wait_condition: WaitCondition,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_post_delay_ms")]
    pub post_delay_ms: u64,
    pub output_filename: String,
    #[serde(default = "default_full_page")]
    pub full_page: bool,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub optional: bool,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_post_delay_ms() -> u64 {
    1_000
}

fn default_full_page() -> bool {
    true
}

fn default_category() -> String {
    String::from("other")
}

impl CaptureFlow {
    pub fn new(name: &str, target: &str, output_filename: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            wait_condition: WaitCondition::NetworkIdle,
            timeout_ms: default_timeout_ms(),
            post_delay_ms: default_post_delay_ms(),
            output_filename: output_filename.to_string(),
            full_page: true,
            category: category.to_string(),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn viewport_only(mut self) -> Self {
        self.full_page = false;
        self
    }

    pub fn with_delay(mut self, post_delay_ms: u64) -> Self {
        self.post_delay_ms = post_delay_ms;
        self
    }

    pub fn with_wait(mut self, wait_condition: WaitCondition) -> Self {
        self.wait_condition = wait_condition;
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Full URL of the flow target for the given deployment.
    pub fn resolve_target(&self, base_url: &str) -> String {
        resolve_url(base_url, &self.target)
    }
}

/// An application page watched for drift.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub path: String,
}

impl Endpoint {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    pub fn resolve(&self, base_url: &str) -> String {
        resolve_url(base_url, &self.path)
    }
}

/// Contents of a flows file.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct FlowCatalogue {
    #[serde(default)]
    pub flows: Vec<CaptureFlow>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl FlowCatalogue {
    /// Sorted, de-duplicated category names.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.flows.iter().map(|f| f.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn flows_in_category(&self, category: &str) -> Vec<CaptureFlow> {
        self.flows
            .iter()
            .filter(|f| f.category == category)
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flows.is_empty() {
            return Err(ConfigError::FlowsEmpty(
                "at least one capture flow is required".to_string(),
            ));
        }
        validate_flows(&self.flows)?;

        let mut names = HashSet::new();
        for endpoint in &self.endpoints {
            if !names.insert(endpoint.name.as_str()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.name.clone()));
            }
        }
        Ok(())
    }
}

/// Checks the per-flow invariants and the uniqueness of output filenames.
pub fn validate_flows(flows: &[CaptureFlow]) -> Result<(), ConfigError> {
    let mut outputs = HashSet::new();
    for flow in flows {
        if flow.name.trim().is_empty() {
            return Err(ConfigError::InvalidFlow(format!(
                "flow targeting {} has no name",
                flow.target
            )));
        }
        if flow.output_filename.trim().is_empty() {
            return Err(ConfigError::InvalidFlow(format!(
                "{}: empty output filename",
                flow.name
            )));
        }
        if flow.timeout_ms == 0 {
            return Err(ConfigError::NotInRange(format!(
                "{}: timeout_ms must be greater than 0",
                flow.name
            )));
        }
        if !outputs.insert(flow.output_filename.as_str()) {
            return Err(ConfigError::DuplicateOutput(flow.output_filename.clone()));
        }
    }
    Ok(())
}

fn resolve_url(base_url: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if target.is_empty() || target == "/" {
        return format!("{}/", base);
    }
    if target.starts_with('/') {
        format!("{}{}", base, target)
    } else {
        format!("{}/{}", base, target)
    }
}
