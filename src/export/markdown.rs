//! Markdown export, grouped by month.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::Result;
use crate::fs::{ensure_dir, OutputLayout};
use crate::record::{MediaKind, Record};

/// Heading used for records whose date does not parse.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Records bucketed by `YYYY-MM`, newest month first, undated last.
pub fn group_by_month(records: &[Record]) -> Vec<(Option<String>, Vec<&Record>)> {
    let mut months: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
    let mut undated = Vec::new();

    for record in records {
        match record.year_month() {
            Some(month) => months.entry(month).or_default().push(record),
            None => undated.push(record),
        }
    }

    let mut groups: Vec<(Option<String>, Vec<&Record>)> = months
        .into_iter()
        .rev()
        .map(|(month, records)| (Some(month), records))
        .collect();
    if !undated.is_empty() {
        groups.push((None, undated));
    }
    groups
}

/// Render a full document. `media_prefix` is prepended to local media paths
/// so links resolve from where the file is written.
pub fn render_markdown(records: &[Record], title: &str, media_prefix: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", title);
    let _ = writeln!(
        out,
        "**Exported:** {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "**Total posts:** {}\n", records.len());
    out.push_str("---\n");

    for (month, group) in group_by_month(records) {
        let heading = month.as_deref().unwrap_or(UNKNOWN_DATE);
        let _ = writeln!(out, "\n## {} ({} posts)", heading, group.len());

        for record in group {
            render_record(&mut out, record, media_prefix);
        }
    }

    out
}

fn render_record(out: &mut String, record: &Record, media_prefix: &str) {
    let user = &record.user;
    let _ = writeln!(
        out,
        "\n### [@{0}](https://x.com/{0})",
        user.screen_name
    );
    let verified = if user.verified { " ✓" } else { "" };
    let _ = writeln!(out, "**{}**{}", user.name, verified);

    let date = record
        .created_datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.created_at.clone());
    let _ = writeln!(out, "*{}*", date);

    let _ = writeln!(out, "\n{}\n", record.text);

    if !record.media.is_empty() {
        out.push_str("**Media:**\n\n");
        for media in &record.media {
            match (&media.local_path, media.kind) {
                (Some(local), MediaKind::Photo) => {
                    let _ = writeln!(out, "![Image]({}{})\n", media_prefix, local);
                }
                (Some(local), MediaKind::AnimatedGif) => {
                    let _ = writeln!(out, "![GIF]({}{})\n", media_prefix, local);
                }
                (Some(local), _) => {
                    let _ = writeln!(out, "[Video]({}{})\n", media_prefix, local);
                }
                (None, MediaKind::Photo) if media.media_url.is_some() => {
                    let _ = writeln!(
                        out,
                        "![Image]({})\n",
                        media.media_url.as_deref().unwrap_or_default()
                    );
                }
                (None, kind) => {
                    let link = media.download_url().unwrap_or(&media.url);
                    let _ = writeln!(out, "[{}]({})\n", kind.as_str(), link);
                }
            }
        }
    }

    let e = &record.engagement;
    let stats: Vec<String> = [
        ("🔁", e.retweet_count),
        ("❤️", e.favorite_count),
        ("💬", e.reply_count),
        ("👁️", e.view_count),
    ]
    .into_iter()
    .filter_map(|(icon, count)| count.filter(|c| *c > 0).map(|c| format!("{} {}", icon, c)))
    .collect();
    if !stats.is_empty() {
        let _ = writeln!(out, "*{}*\n", stats.join(" · "));
    }

    let _ = writeln!(out, "[View on X]({})", record.url());

    if !record.hashtags.is_empty() {
        let tags: Vec<String> = record.hashtags.iter().map(|t| format!("#{}", t)).collect();
        let _ = writeln!(out, "\n**Tags:** {}", tags.join(" "));
    }

    out.push_str("\n---\n");
}

/// Write the whole collection to one document.
pub fn export_markdown(records: &[Record], path: &Path) -> Result<()> {
    std::fs::write(path, render_markdown(records, "X Liked Posts", ""))?;
    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Write one document per month into `by_month/`. Returns the files written.
pub fn export_markdown_by_month(records: &[Record], layout: &OutputLayout) -> Result<Vec<PathBuf>> {
    ensure_dir(&layout.by_month_dir())?;

    let mut written = Vec::new();
    for (month, group) in group_by_month(records) {
        let key = month.as_deref().unwrap_or("unknown");
        let owned: Vec<Record> = group.into_iter().cloned().collect();
        let title = format!("X Liked Posts - {}", month.as_deref().unwrap_or(UNKNOWN_DATE));

        let path = layout.month_path(key);
        std::fs::write(&path, render_markdown(&owned, &title, "../"))?;
        written.push(path);
    }

    tracing::debug!("Wrote {} monthly files", written.len());
    Ok(written)
}
