pub mod controller_handler;
pub mod health;
pub mod side_effects;
pub mod types;

pub use controller_handler::Controller;
pub use types::{ControllerState, CycleOutcome, StopReason};
