//! X web API module.
//!
//! This module provides:
//! - Session credentials and request headers
//! - HTTP client for the Likes GraphQL timeline
//! - Rate-limit window tracking
//! - API response types

pub mod auth;
pub mod client;
pub mod rate_limit;
pub mod types;

pub use auth::{load_cookies, parse_cookies, Cookie, CredentialContext};
pub use client::{ClientOptions, PageResponse, XApi};
pub use rate_limit::{RateLimitTracker, RateLimitWindow};
pub use types::{LikesPage, TimelineEntry};
