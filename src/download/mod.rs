//! Download module.
//!
//! This module provides:
//! - Bounded, cancellable media downloading
//! - Photo optimisation

pub mod media;
pub mod optimize;

pub use media::{DownloadOptions, DownloadSummary, MediaDownloader};
pub use optimize::{optimize_photo, OptimizeOptions};
