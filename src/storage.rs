//! Storage subsystem
//!
//! Components:
//! - `cache_store`: the fingerprint cache of the change detector.
//! - `report_store`: the report of the latest capture run.
//! - `types`: persisted record types.

pub mod cache_store;
pub mod report_store;
pub mod types;
