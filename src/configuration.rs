pub mod catalogue;
pub mod config;
pub mod types;

pub use types::{CaptureFlow, Endpoint, FlowCatalogue, WaitCondition};
