use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    Idle,
    HealthChecking,
    Detecting,
    Backoff,
    Triggering,
    Stopped,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "Idle",
            ControllerState::HealthChecking => "HealthChecking",
            ControllerState::Detecting => "Detecting",
            ControllerState::Backoff => "Backoff",
            ControllerState::Triggering => "Triggering",
            ControllerState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// One entry of the controller's audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub at: DateTime<Utc>,
    pub from: ControllerState,
    pub to: ControllerState,
}

/// Why the monitoring loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop signal fired.
    Cancelled,
    /// The base URL stayed unreachable for `failures` consecutive checks.
    TargetUnreachable { failures: u32 },
}

impl StopReason {
    /// Whether the binary should report failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StopReason::TargetUnreachable { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "stop requested"),
            StopReason::TargetUnreachable { failures } => write!(
                f,
                "target unreachable after {} consecutive health checks",
                failures
            ),
        }
    }
}

/// What one monitoring cycle did, as seen from the outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Unhealthy { consecutive_failures: u32 },
    NoChanges,
    Captured {
        changes: usize,
        failed_flows: usize,
        committed: bool,
    },
    /// Drift was found but the flow list was refused before any capture.
    CaptureRejected { changes: usize },
    Stopped(StopReason),
}
