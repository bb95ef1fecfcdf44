//! Command-line argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{normalize_formats, Config, ExportFormat};

/// X liked posts exporter CLI.
#[derive(Parser, Debug)]
#[command(
    name = "x-likes-exporter",
    version,
    about = "Export your liked posts from X (Twitter)",
    long_about = "Fetch every post a user has liked through the X web API, optionally download \
                  attached media, and write the result as JSON, CSV, Markdown, HTML and Excel.\n\n\
                  Requires a cookies file exported from a logged-in browser session."
)]
pub struct Args {
    /// Path to the cookies JSON file exported from the browser.
    pub cookies: PathBuf,

    /// Numeric id of the user whose likes are exported.
    pub user_id: String,

    /// Output directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export formats; repeat or comma-separate. Defaults to all.
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub format: Vec<FormatArg>,

    /// Don't download media.
    #[arg(long)]
    pub no_media: bool,

    /// Keep the raw API payload in the JSON export.
    #[arg(long)]
    pub include_raw: bool,

    /// Print detailed statistics after the export.
    #[arg(long)]
    pub stats: bool,

    /// Write a single Markdown file instead of also splitting by month.
    #[arg(long)]
    pub single_file: bool,

    /// Resume from a previous checkpoint for the same user.
    #[arg(long)]
    pub resume: bool,

    /// Show checkpoint information and exit.
    #[arg(long)]
    pub checkpoint_info: bool,

    /// Delete any existing checkpoint and exit.
    #[arg(long)]
    pub clear_checkpoint: bool,

    /// Posts requested per page (1-100).
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Retries per page for transient failures.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Concurrent media downloads.
    #[arg(long)]
    pub workers: Option<usize>,

    /// GraphQL query id of the Likes operation (skips discovery).
    #[arg(long, env = "X_LIKES_QUERY_ID")]
    pub query_id: Option<String>,

    /// Stop after this many seconds, keeping what was collected.
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
    #[value(alias = "md")]
    Markdown,
    Html,
    #[value(alias = "xlsx")]
    Excel,
    /// Every format.
    All,
}

impl FormatArg {
    fn expand(self) -> Vec<ExportFormat> {
        match self {
            FormatArg::Json => vec![ExportFormat::Json],
            FormatArg::Csv => vec![ExportFormat::Csv],
            FormatArg::Markdown => vec![ExportFormat::Markdown],
            FormatArg::Html => vec![ExportFormat::Html],
            FormatArg::Excel => vec![ExportFormat::Excel],
            FormatArg::All => ExportFormat::ALL.to_vec(),
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        config.auth.cookies_file = Some(self.cookies.clone());
        config.auth.user_id = Some(self.user_id.trim().to_string());

        if let Some(query_id) = &self.query_id {
            config.auth.query_id = Some(query_id.clone());
        }

        if let Some(dir) = &self.output {
            config.export.output_directory = dir.clone();
        }

        if !self.format.is_empty() {
            config.export.formats =
                normalize_formats(self.format.iter().flat_map(|f| f.expand()));
        }

        // Boolean flags (only override if set to non-default)
        if self.no_media {
            config.download.enabled = false;
        }

        if self.include_raw {
            config.export.include_raw = true;
        }

        if self.stats {
            config.export.show_stats = true;
        }

        if self.single_file {
            config.export.split_markdown_by_month = false;
        }

        if let Some(page_size) = self.page_size {
            config.fetch.page_size = page_size;
        }

        if let Some(retries) = self.max_retries {
            config.fetch.max_retries = retries;
        }

        if let Some(workers) = self.workers {
            config.download.workers = workers;
        }

        if let Some(timeout) = self.timeout_secs {
            config.fetch.run_timeout_secs = Some(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("x-likes-exporter").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_positionals_required() {
        assert!(Args::try_parse_from(["x-likes-exporter", "cookies.json"]).is_err());
        let args = parse(&["cookies.json", "123"]);
        assert_eq!(args.cookies, PathBuf::from("cookies.json"));
        assert_eq!(args.user_id, "123");
        assert!(args.format.is_empty());
    }

    #[test]
    fn test_merge_defaults_untouched() {
        let mut config = Config::default();
        parse(&["cookies.json", "123"]).merge_into_config(&mut config);

        assert_eq!(config.auth.user_id.as_deref(), Some("123"));
        assert!(config.download.enabled);
        assert_eq!(config.export.formats, ExportFormat::ALL.to_vec());
        assert!(config.export.split_markdown_by_month);
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = Config::default();
        parse(&[
            "cookies.json",
            "123",
            "-o",
            "exports",
            "-f",
            "json,md",
            "--format",
            "json",
            "--no-media",
            "--single-file",
            "--stats",
            "--page-size",
            "50",
            "--workers",
            "2",
            "--timeout",
            "300",
        ])
        .merge_into_config(&mut config);

        assert_eq!(config.export.output_directory, PathBuf::from("exports"));
        assert_eq!(
            config.export.formats,
            vec![ExportFormat::Json, ExportFormat::Markdown]
        );
        assert!(!config.download.enabled);
        assert!(!config.export.split_markdown_by_month);
        assert!(config.export.show_stats);
        assert_eq!(config.fetch.page_size, 50);
        assert_eq!(config.download.workers, 2);
        assert_eq!(config.fetch.run_timeout_secs, Some(300));
    }

    #[test]
    fn test_format_all() {
        let mut config = Config::default();
        config.export.formats = vec![ExportFormat::Csv];
        parse(&["c.json", "1", "-f", "all"]).merge_into_config(&mut config);
        assert_eq!(config.export.formats.len(), 5);

        parse(&["c.json", "1", "-f", "xlsx"]).merge_into_config(&mut config);
        assert_eq!(config.export.formats, vec![ExportFormat::Excel]);
    }
}
