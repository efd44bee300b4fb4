//! Drift detection over a fixed set of endpoints.
//!
//! A pass visits every endpoint in declared order through the shared
//! [`PageDriver`], fingerprints the returned document and compares it with the
//! cached fingerprint. The cache is updated for every endpoint that could be
//! fetched, drift or not, and written once at the end of the pass.

use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};

use super::fingerprint::fingerprint;
use super::types::ChangeRecord;
use crate::configuration::types::{Endpoint, WaitCondition};
use crate::error_handling::types::DriverError;
use crate::page_driver::PageDriver;
use crate::storage::cache_store::CacheStore;
use crate::storage::types::CacheEntry;

pub struct ChangeDetector {
    base_url: String,
    fetch_timeout: Duration,
    store: Box<dyn CacheStore>,
}

impl ChangeDetector {
    pub fn new(base_url: &str, fetch_timeout: Duration, store: Box<dyn CacheStore>) -> Self {
        Self {
            base_url: base_url.to_string(),
            fetch_timeout,
            store,
        }
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    /// Runs one detection pass and returns the endpoints that drifted.
    ///
    /// Fetch failures skip the endpoint for this pass. A failed cache write is
    /// logged; the in-memory entries stay updated and the next pass writes
    /// them again.
    pub async fn check_all(
        &mut self,
        driver: &mut dyn PageDriver,
        endpoints: &[Endpoint],
    ) -> Vec<ChangeRecord> {
        let mut changes = Vec::new();

        for endpoint in endpoints {
            let url = endpoint.resolve(&self.base_url);
            let content = match self.fetch(driver, &url).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Could not check {} ({}): {}", endpoint.name, url, e);
                    continue;
                }
            };

            let current = fingerprint(&content);
            let now = Utc::now();

            match self.store.get(&endpoint.name) {
                Some(cached) if cached.fingerprint != current => {
                    info!("Change detected in {}", endpoint.name);
                    changes.push(ChangeRecord {
                        endpoint_name: endpoint.name.clone(),
                        source_path: endpoint.path.clone(),
                        old_fingerprint: cached.fingerprint.clone(),
                        new_fingerprint: current.clone(),
                        detected_at: now,
                    });
                }
                Some(_) => debug!("{} unchanged", endpoint.name),
                None => info!("Baseline recorded for {}", endpoint.name),
            }

            self.store.upsert(CacheEntry {
                endpoint_name: endpoint.name.clone(),
                fingerprint: current,
                last_checked_at: now,
                source_path: endpoint.path.clone(),
            });
        }

        if let Err(e) = self.store.persist() {
            error!("Failed to persist fingerprint cache: {}", e);
        }
        changes
    }

    async fn fetch(&self, driver: &mut dyn PageDriver, url: &str) -> Result<Vec<u8>, DriverError> {
        driver
            .navigate(url, &WaitCondition::None, self.fetch_timeout)
            .await?;
        driver.content().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::types::StorageError;
    use crate::page_driver::scripted::ScriptedDriver;
    use crate::storage::cache_store::FileCacheStore;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const BASE: &str = "https://localhost";

    fn endpoints() -> Vec<Endpoint> {
        vec![Endpoint::new("A", "/a"), Endpoint::new("B", "/b")]
    }

    struct ReadOnlyStore {
        entries: BTreeMap<String, CacheEntry>,
    }

    impl CacheStore for ReadOnlyStore {
        fn get(&self, endpoint_name: &str) -> Option<&CacheEntry> {
            self.entries.get(endpoint_name)
        }

        fn upsert(&mut self, entry: CacheEntry) {
            self.entries.insert(entry.endpoint_name.clone(), entry);
        }

        fn entries(&self) -> Vec<&CacheEntry> {
            self.entries.values().collect()
        }

        fn persist(&self) -> Result<(), StorageError> {
            Err(StorageError::WriteFailed("read-only filesystem".into()))
        }
    }

    #[tokio::test]
    async fn test_baseline_then_drift() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        let cache_path = dir.path().join(".ui_cache.json");
        let store = FileCacheStore::open(&cache_path).unwrap();
        let mut detector = ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store));
        let mut driver = ScriptedDriver::new()
            .with_page("https://localhost/a", "<p>a v1</p>")
            .with_page("https://localhost/b", "<p>b v1</p>");

        let first = detector.check_all(&mut driver, &endpoints()).await;
        assert!(first.is_empty());
        assert_eq!(detector.store().entries().len(), 2);
        assert!(cache_path.exists());

        driver.set_page("https://localhost/a", "<p>a v2</p>");
        let second = detector.check_all(&mut driver, &endpoints()).await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].endpoint_name, "A");
        assert_eq!(second[0].source_path, "/a");
        assert_ne!(second[0].old_fingerprint, second[0].new_fingerprint);
        assert_eq!(
            detector.store().get("A").unwrap().fingerprint,
            second[0].new_fingerprint
        );
    }

    #[tokio::test]
    async fn test_unchanged_content_keeps_fingerprint() {
        let dir = TempDir::new().unwrap();
        let store = FileCacheStore::open(dir.path().join(".ui_cache.json")).unwrap();
        let mut detector = ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store));
        let mut driver = ScriptedDriver::new()
            .with_page("https://localhost/a", "<p>same</p>\n")
            .with_page("https://localhost/b", "<p>b</p>");

        detector.check_all(&mut driver, &endpoints()).await;
        let before = detector.store().get("A").unwrap().clone();

        // byte-identical after normalization
        driver.set_page("https://localhost/a", "<p>same</p>  \r\n");
        let changes = detector.check_all(&mut driver, &endpoints()).await;
        assert!(changes.is_empty());

        let after = detector.store().get("A").unwrap();
        assert_eq!(after.fingerprint, before.fingerprint);
        assert!(after.last_checked_at >= before.last_checked_at);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_endpoint() {
        let dir = TempDir::new().unwrap();
        let store = FileCacheStore::open(dir.path().join(".ui_cache.json")).unwrap();
        let mut detector = ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store));
        let mut driver = ScriptedDriver::new().with_page("https://localhost/b", "<p>b</p>");

        let changes = detector.check_all(&mut driver, &endpoints()).await;
        assert!(changes.is_empty());
        assert!(detector.store().get("A").is_none());
        assert!(detector.store().get("B").is_some());
        assert_eq!(driver.navigation_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_survives_restart() {
        let dir = TempDir::new().unwrap();
        let cache_path = dir.path().join(".ui_cache.json");
        let mut driver = ScriptedDriver::new()
            .with_page("https://localhost/a", "<p>a</p>")
            .with_page("https://localhost/b", "<p>b</p>");

        {
            let store = FileCacheStore::open(&cache_path).unwrap();
            let mut detector =
                ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store));
            detector.check_all(&mut driver, &endpoints()).await;
        }

        driver.set_page("https://localhost/b", "<p>b changed</p>");
        let store = FileCacheStore::open(&cache_path).unwrap();
        let mut detector = ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store));
        let changes = detector.check_all(&mut driver, &endpoints()).await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].endpoint_name, "B");
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory_state() {
        let store = ReadOnlyStore {
            entries: BTreeMap::new(),
        };
        let mut detector = ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store));
        let mut driver = ScriptedDriver::new()
            .with_page("https://localhost/a", "<p>a</p>")
            .with_page("https://localhost/b", "<p>b</p>");

        detector.check_all(&mut driver, &endpoints()).await;
        assert_eq!(detector.store().entries().len(), 2);

        driver.set_page("https://localhost/a", "<p>a2</p>");
        let changes = detector.check_all(&mut driver, &endpoints()).await;
        assert_eq!(changes.len(), 1);
    }

    #[tokio::test]
    async fn test_nondeterministic_page_reports_drift_every_pass() {
        let dir = TempDir::new().unwrap();
        let store = FileCacheStore::open(dir.path().join(".ui_cache.json")).unwrap();
        let mut detector = ChangeDetector::new(BASE, Duration::from_secs(15), Box::new(store));
        let mut driver = ScriptedDriver::new()
            .with_page("https://localhost/a", "<p nonce=1>a</p>")
            .with_page("https://localhost/b", "<p>b</p>");

        detector.check_all(&mut driver, &endpoints()).await;
        for nonce in 2..4 {
            driver.set_page("https://localhost/a", &format!("<p nonce={}>a</p>", nonce));
            let changes = detector.check_all(&mut driver, &endpoints()).await;
            assert_eq!(changes.len(), 1);
        }
    }
}
