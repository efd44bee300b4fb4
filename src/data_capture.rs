//! Capture subsystem
//!
//! Turns a list of capture flows into screenshots and a run report.
//!
//! Components:
//! - `orchestrator`: sequential execution with per-flow retry and skip rules.
//! - `types`: per-flow results and the aggregated run report.
//! - `backup`: copy of the previous artifacts taken before a run.

pub mod backup;
pub mod orchestrator;
pub mod types;

pub use orchestrator::{CaptureOrchestrator, RetryPolicy};
pub use types::{CaptureResult, FlowOutcome, RunReport};
