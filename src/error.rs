//! Error types for the x-likes-exporter application.

use thiserror::Error;

use crate::api::rate_limit::RateLimitWindow;
use crate::record::RecordCollection;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid session credentials: {0}")]
    AuthConfig(String),

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transient fetch failure: {0}")]
    Transient(String),

    #[error("Rate limited{}", .window.map(|w| format!(" until {}", w.reset_at)).unwrap_or_default())]
    RateLimited { window: Option<RateLimitWindow> },

    #[error("Fetch aborted after {} attempt(s) with {} record(s) collected: {}", .0.attempts, .0.records.len(), .0.reason)]
    FetchAborted(Box<AbortedFetch>),

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    // Export errors
    #[error("Export failed: {0}")]
    Export(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// State carried out of a fetch run that exhausted its retry budget.
#[derive(Debug)]
pub struct AbortedFetch {
    /// Every record collected before the failing page.
    pub records: RecordCollection,
    /// Cursor of the page that could not be fetched.
    pub cursor: Option<String>,
    /// Attempts made for the failing page.
    pub attempts: u32,
    /// Last error message seen.
    pub reason: String,
}

impl Error {
    /// Whether the failure is worth retrying against the same page.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transient(_) | Error::RateLimited { .. } => true,
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            _ => false,
        }
    }

    /// Rate-limit window attached to a 429 response, if any.
    pub fn rate_limit_window(&self) -> Option<RateLimitWindow> {
        match self {
            Error::RateLimited { window } => *window,
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const FETCH_ABORTED: i32 = 6;
    pub const EXPORT_ERROR: i32 = 7;
}
