//! Fetch module.
//!
//! Provides:
//! - The Likes pagination loop
//! - Resume checkpoints

pub mod checkpoint;
pub mod engine;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use engine::{
    CheckpointFn, FetchEngine, FetchOptions, FetchOutcome, FetchReport, LikesSource, ProgressFn,
};
