//! Filesystem module.
//!
//! Provides:
//! - Output directory layout
//! - Filename generation and extension detection

pub mod naming;
pub mod paths;

pub use naming::{media_filename, resolve_extension, sanitize_filename};
pub use paths::{ensure_dir, OutputLayout};
