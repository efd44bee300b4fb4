//! Browser abstraction shared by change detection and capture.

pub mod chromium;
pub mod driver;
#[cfg(test)]
pub(crate) mod scripted;
pub mod selector;

pub use chromium::ChromiumDriver;
pub use driver::{ArtifactMeta, PageDriver};
