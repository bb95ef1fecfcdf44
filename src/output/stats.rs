//! Statistics reporting.

use console::style;

use crate::download::DownloadSummary;
use crate::fetch::FetchReport;
use crate::record::{DownloadStatus, Record};

/// Totals computed from what was actually collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub total_records: usize,
    pub total_media: usize,
    pub media_downloaded: usize,
    pub media_failed: usize,
    pub records_with_media: usize,
    pub retweets: usize,
    pub quotes: usize,
    /// Sum of known retweet counts.
    pub total_retweet_count: u64,
    /// Sum of known favorite counts.
    pub total_favorite_count: u64,
}

impl ExportStats {
    pub fn from_records(records: &[Record]) -> Self {
        let mut stats = ExportStats {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records {
            stats.total_media += record.media.len();
            if !record.media.is_empty() {
                stats.records_with_media += 1;
            }
            if record.is_retweet {
                stats.retweets += 1;
            }
            if record.is_quote {
                stats.quotes += 1;
            }
            stats.total_retweet_count += record.engagement.retweet_count.unwrap_or(0);
            stats.total_favorite_count += record.engagement.favorite_count.unwrap_or(0);

            for media in &record.media {
                match media.download {
                    DownloadStatus::Downloaded => stats.media_downloaded += 1,
                    DownloadStatus::Failed(_) => stats.media_failed += 1,
                    DownloadStatus::NotRequested | DownloadStatus::NotDownloaded => {}
                }
            }
        }

        stats
    }
}

/// Print detailed statistics (`--stats`).
pub fn print_stats(stats: &ExportStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Export Statistics:").bold());
    println!("  Liked posts:      {}", stats.total_records);
    println!("  With media:       {}", stats.records_with_media);
    println!("  Media items:      {}", stats.total_media);
    println!("  Downloaded:       {}", stats.media_downloaded);
    if stats.media_failed > 0 {
        println!("  Failed:           {}", style(stats.media_failed).red());
    }
    println!("  Retweets:         {}", stats.retweets);
    println!("  Quotes:           {}", stats.quotes);
    println!("  Total retweets:   {}", stats.total_retweet_count);
    println!("  Total likes:      {}", stats.total_favorite_count);
    println!("{}", style("═".repeat(50)).dim());
}

/// Print a summary line for quick viewing.
pub fn print_summary(report: &FetchReport, stats: &ExportStats, downloads: Option<&DownloadSummary>) {
    println!(
        "Collected: {} posts in {} pages ({} retries, {} skipped entries)",
        style(stats.total_records).green(),
        report.pages_fetched,
        report.retries,
        style(report.skipped_entries).yellow()
    );
    if let Some(d) = downloads {
        println!(
            "Media: {} downloaded, {} existing, {} failed, {} not started",
            style(d.downloaded).green(),
            d.skipped,
            style(d.failed).red(),
            d.cancelled
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::item::fixtures::{photo, record};

    #[test]
    fn test_from_records() {
        let mut a = record("1");
        a.is_retweet = true;
        a.engagement.retweet_count = Some(3);
        a.engagement.favorite_count = Some(10);
        let mut downloaded = photo("https://pbs.twimg.com/media/a.jpg");
        downloaded.download = DownloadStatus::Downloaded;
        let mut failed = photo("https://pbs.twimg.com/media/b.jpg");
        failed.download = DownloadStatus::Failed("HTTP 404".to_string());
        a.media = vec![downloaded, failed];

        let mut b = record("2");
        b.is_quote = true;
        b.engagement.favorite_count = Some(5);

        let stats = ExportStats::from_records(&[a, b, record("3")]);

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.total_media, 2);
        assert_eq!(stats.records_with_media, 1);
        assert_eq!(stats.media_downloaded, 1);
        assert_eq!(stats.media_failed, 1);
        assert_eq!(stats.retweets, 1);
        assert_eq!(stats.quotes, 1);
        assert_eq!(stats.total_retweet_count, 3);
        assert_eq!(stats.total_favorite_count, 15);
    }

    #[test]
    fn test_empty() {
        assert_eq!(ExportStats::from_records(&[]), ExportStats::default());
    }
}
