//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::auth::WEB_BEARER_TOKEN;
use crate::api::client::{ClientOptions, API_BASE, DEFAULT_USER_AGENT};
use crate::config::formats::ExportFormat;
use crate::download::{DownloadOptions, OptimizeOptions};
use crate::error::{Error, Result};
use crate::fetch::FetchOptions;
use crate::fs::OutputLayout;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Session and request identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Exported browser cookies (JSON array).
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    /// Numeric id of the account whose likes are exported.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// GraphQL query id of the Likes operation; discovered when unset.
    #[serde(default)]
    pub query_id: Option<String>,

    /// Authorization header value.
    #[serde(default = "default_bearer_token")]
    pub bearer_token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookies_file: None,
            user_id: None,
            user_agent: default_user_agent(),
            query_id: None,
            bearer_token: default_bearer_token(),
        }
    }
}

/// Pagination loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Posts requested per page.
    pub page_size: u32,

    /// Minimum spacing between requests.
    pub request_delay_ms: u64,

    /// Retries per page for transient failures.
    pub max_retries: u32,

    /// Backoff when a failure carries no rate-limit headers.
    pub fallback_backoff_secs: u64,

    /// Consecutive pages without new posts before stopping.
    pub empty_page_limit: u32,

    /// Pages between checkpoint saves.
    pub checkpoint_interval: u32,

    /// Stop the run (keeping partial results) after this many seconds.
    pub run_timeout_secs: Option<u64>,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            request_delay_ms: 1000,
            max_retries: 5,
            fallback_backoff_secs: 30,
            empty_page_limit: 2,
            checkpoint_interval: 10,
            run_timeout_secs: None,
            request_timeout_secs: 30,
        }
    }
}

/// Media download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub enabled: bool,

    /// Concurrent downloads.
    pub workers: usize,

    /// Downscale and re-encode photos.
    pub optimize_images: bool,

    pub max_image_dimension: u32,

    pub jpeg_quality: u8,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workers: 4,
            optimize_images: true,
            max_image_dimension: 1920,
            jpeg_quality: 85,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_directory: PathBuf,

    pub formats: Vec<ExportFormat>,

    /// Keep the raw API payload in JSON output.
    pub include_raw: bool,

    /// Also write one Markdown file per month.
    pub split_markdown_by_month: bool,

    /// Print detailed statistics after the run.
    pub show_stats: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("output"),
            formats: ExportFormat::ALL.to_vec(),
            include_raw: false,
            split_markdown_by_month: true,
            show_stats: false,
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_bearer_token() -> String {
    WEB_BEARER_TOKEN.to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults.
    ///
    /// The flag reports whether a file was read.
    pub fn load_or_default(path: &Path) -> Result<(Self, bool)> {
        if path.exists() {
            Ok((Self::load(path)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::new(&self.export.output_directory)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: API_BASE.to_string(),
            user_agent: self.auth.user_agent.clone(),
            query_id: self.auth.query_id.clone().filter(|q| !q.is_empty()),
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            request_delay: Duration::from_millis(self.fetch.request_delay_ms),
            max_retries: self.fetch.max_retries,
            fallback_backoff: Duration::from_secs(self.fetch.fallback_backoff_secs),
            empty_page_limit: self.fetch.empty_page_limit,
            checkpoint_interval: self.fetch.checkpoint_interval,
            keep_raw: self.export.include_raw,
        }
    }

    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            workers: self.download.workers,
            optimize: self.download.optimize_images.then_some(OptimizeOptions {
                max_dimension: self.download.max_image_dimension,
                quality: self.download.jpeg_quality,
            }),
        }
    }

    /// Run deadline, if one is configured.
    pub fn run_timeout(&self) -> Option<Duration> {
        self.fetch.run_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch.page_size, 20);
        assert_eq!(config.fetch.request_delay_ms, 1000);
        assert_eq!(config.fetch.empty_page_limit, 2);
        assert_eq!(config.download.workers, 4);
        assert_eq!(config.export.output_directory, PathBuf::from("output"));
        assert_eq!(config.export.formats.len(), 5);
        assert_eq!(config.auth.bearer_token, WEB_BEARER_TOKEN);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [fetch]
            page_size = 50
            run_timeout_secs = 600

            [export]
            formats = ["json"]
            "#,
        )
        .unwrap();

        assert_eq!(config.fetch.page_size, 50);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.run_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.export.formats, vec![ExportFormat::Json]);
        assert!(config.export.split_markdown_by_month);
        assert_eq!(config.auth.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let (config, loaded) = Config::load_or_default(&path).unwrap();
        assert!(!loaded);
        assert_eq!(config.fetch.page_size, 20);

        let mut custom = Config::default();
        custom.download.workers = 2;
        custom.auth.query_id = Some("abc".to_string());
        custom.save(&path).unwrap();

        let (config, loaded) = Config::load_or_default(&path).unwrap();
        assert!(loaded);
        assert_eq!(config.download.workers, 2);
        assert_eq!(config.client_options().query_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_derived_options() {
        let mut config = Config::default();
        config.export.include_raw = true;
        config.download.optimize_images = false;

        let fetch = config.fetch_options();
        assert!(fetch.keep_raw);
        assert_eq!(fetch.request_delay, Duration::from_secs(1));
        assert!(config.download_options().optimize.is_none());
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fetch\npage_size = ").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
    }
}
