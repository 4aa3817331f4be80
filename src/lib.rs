pub mod core;
pub mod edgar;
pub mod export;
pub mod web;

// Re-exports
pub use crate::core::config::Config;
pub use crate::export::{export_report, ExportError, ExportRequest};
