//! Worship Journey library - shared modules for the report and analysis binaries.

pub mod baseline;
pub mod copyright;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod publisher;
pub mod records;
pub mod report;
pub mod safety;
pub mod stats;
