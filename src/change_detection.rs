pub mod detector;
pub mod fingerprint;
pub mod types;

pub use detector::ChangeDetector;
pub use types::ChangeRecord;
