//! Configuration module.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Export format selection
//! - Configuration validation

pub mod formats;
pub mod loader;
pub mod validation;

pub use formats::{normalize_formats, ExportFormat};
pub use loader::{AuthConfig, Config, DownloadConfig, ExportConfig, FetchConfig};
pub use validation::{validate_config, validate_user_id};
