pub mod change_detection;
pub mod configuration;
pub mod controller;
pub mod data_capture;
pub mod error_handling;
pub mod page_driver;
pub mod storage;
