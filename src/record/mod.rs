//! Record module.
//!
//! Provides:
//! - The normalized liked-post model
//! - Normalization from raw API entries
//! - The ordered, deduplicated collection

pub mod collection;
pub mod item;
pub mod parser;

pub use collection::RecordCollection;
pub use item::{Author, DownloadStatus, Engagement, MediaKind, MediaRef, Record};
pub use parser::{parse_record, SkipReason};
