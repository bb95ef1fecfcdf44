//! Single-page HTML export.

use std::fmt::Write as _;
use std::path::Path;

use chrono::Utc;

use crate::error::Result;
use crate::record::{MediaKind, Record};

const STYLE: &str = r#"<style>
  body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; background: #f5f5f5; }
  .container { background: #fff; padding: 40px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
  h1 { color: #1d9bf0; margin-bottom: 10px; }
  .meta { color: #666; margin-bottom: 30px; }
  .post { border: 1px solid #e1e8ed; border-radius: 10px; padding: 20px; margin-bottom: 20px; background: #fafafa; }
  .user { font-size: 16px; margin-bottom: 10px; }
  .date { color: #666; font-size: 13px; }
  .text { font-size: 18px; line-height: 1.6; margin-bottom: 15px; white-space: pre-wrap; }
  .media img, .media video { max-width: 100%; border-radius: 10px; margin-top: 10px; }
  .stats { color: #666; font-size: 14px; display: flex; gap: 15px; }
  .stats a { color: #1d9bf0; text-decoration: none; }
</style>"#;

/// Escape text for HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the page.
pub fn render_html(records: &[Record]) -> String {
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    out.push_str("<title>X Liked Posts</title>\n");
    out.push_str(STYLE);
    out.push_str("\n</head>\n<body>\n<div class=\"container\">\n");
    out.push_str("<h1>X Liked Posts</h1>\n");
    let _ = writeln!(
        out,
        "<p class=\"meta\">Exported {} &middot; {} posts</p>",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        records.len()
    );

    for record in records {
        render_record(&mut out, record);
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn render_record(out: &mut String, record: &Record) {
    out.push_str("<div class=\"post\">\n");
    let _ = writeln!(
        out,
        "<div class=\"user\"><strong>{}</strong> @{}</div>",
        escape_html(&record.user.name),
        escape_html(&record.user.screen_name)
    );
    if let Some(dt) = record.created_datetime() {
        let _ = writeln!(
            out,
            "<div class=\"date\">{}</div>",
            dt.format("%Y-%m-%d %H:%M")
        );
    }
    let _ = writeln!(out, "<div class=\"text\">{}</div>", escape_html(&record.text));

    if !record.media.is_empty() {
        out.push_str("<div class=\"media\">\n");
        for media in &record.media {
            let local = media.local_path.as_deref();
            match (media.kind, local) {
                (MediaKind::Video | MediaKind::AnimatedGif, Some(path)) => {
                    let _ = writeln!(
                        out,
                        "<video src=\"{}\" controls loop></video>",
                        escape_html(path)
                    );
                }
                _ => {
                    if let Some(src) = local.or(media.media_url.as_deref()) {
                        let _ = writeln!(
                            out,
                            "<img src=\"{}\" alt=\"Post media\" loading=\"lazy\">",
                            escape_html(src)
                        );
                    }
                }
            }
        }
        out.push_str("</div>\n");
    }

    let e = &record.engagement;
    out.push_str("<div class=\"stats\">\n");
    let _ = writeln!(out, "<span>🔁 {}</span>", e.retweet_count.unwrap_or(0));
    let _ = writeln!(out, "<span>❤️ {}</span>", e.favorite_count.unwrap_or(0));
    let _ = writeln!(out, "<span>💬 {}</span>", e.reply_count.unwrap_or(0));
    let _ = writeln!(
        out,
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">View on X</a>",
        escape_html(&record.url())
    );
    out.push_str("</div>\n</div>\n");
}

/// Write the page to `path`.
pub fn export_html(records: &[Record], path: &Path) -> Result<()> {
    std::fs::write(path, render_html(records))?;
    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::item::fixtures::{photo, record};

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut r = record("1");
        r.text = "<b>bold</b> & more".to_string();
        r.user.name = "<img src=x>".to_string();

        let html = render_html(&[r]);

        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; &amp; more"));
        assert!(html.contains("<strong>&lt;img src=x&gt;</strong>"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn test_media_prefers_local_copy() {
        let mut r = record("1");
        let mut local = photo("https://pbs.twimg.com/media/a.jpg");
        local.local_path = Some("media/1_0.jpg".to_string());
        r.media = vec![local, photo("https://pbs.twimg.com/media/b.jpg")];

        let html = render_html(&[r]);

        assert!(html.contains("src=\"media/1_0.jpg\""));
        assert!(html.contains("src=\"https://pbs.twimg.com/media/b.jpg\""));
        assert!(!html.contains("media/a.jpg"));
    }

    #[test]
    fn test_export_html_writes_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("likes.html");
        export_html(&[record("1"), record("2")], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert!(content.contains("2 posts"));
        assert_eq!(content.matches("class=\"post\"").count(), 2);
    }
}
