//! CSV export.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::record::Record;

/// Column names, in row order.
pub(crate) const COLUMNS: [&str; 23] = [
    "tweet_id",
    "text",
    "created_at",
    "user_id",
    "user_screen_name",
    "user_name",
    "user_verified",
    "retweet_count",
    "favorite_count",
    "reply_count",
    "quote_count",
    "view_count",
    "lang",
    "is_retweet",
    "is_quote",
    "has_media",
    "media_count",
    "media_types",
    "url_count",
    "hashtag_count",
    "hashtags",
    "mention_count",
    "tweet_url",
];

/// One export row. Unknown counters are written as empty cells.
#[derive(Debug, Serialize)]
pub(crate) struct LikeRow<'a> {
    pub(crate) tweet_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) created_at: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) user_screen_name: &'a str,
    pub(crate) user_name: &'a str,
    pub(crate) user_verified: bool,
    pub(crate) retweet_count: Option<u64>,
    pub(crate) favorite_count: Option<u64>,
    pub(crate) reply_count: Option<u64>,
    pub(crate) quote_count: Option<u64>,
    pub(crate) view_count: Option<u64>,
    pub(crate) lang: Option<&'a str>,
    pub(crate) is_retweet: bool,
    pub(crate) is_quote: bool,
    pub(crate) has_media: bool,
    pub(crate) media_count: usize,
    pub(crate) media_types: String,
    pub(crate) url_count: usize,
    pub(crate) hashtag_count: usize,
    pub(crate) hashtags: String,
    pub(crate) mention_count: usize,
    pub(crate) tweet_url: String,
}

impl<'a> From<&'a Record> for LikeRow<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            tweet_id: &record.id,
            text: &record.text,
            created_at: &record.created_at,
            user_id: &record.user.id,
            user_screen_name: &record.user.screen_name,
            user_name: &record.user.name,
            user_verified: record.user.verified,
            retweet_count: record.engagement.retweet_count,
            favorite_count: record.engagement.favorite_count,
            reply_count: record.engagement.reply_count,
            quote_count: record.engagement.quote_count,
            view_count: record.engagement.view_count,
            lang: record.lang.as_deref(),
            is_retweet: record.is_retweet,
            is_quote: record.is_quote,
            has_media: !record.media.is_empty(),
            media_count: record.media.len(),
            media_types: record
                .media
                .iter()
                .map(|m| m.kind.as_str())
                .collect::<Vec<_>>()
                .join(","),
            url_count: record.urls.len(),
            hashtag_count: record.hashtags.len(),
            hashtags: record.hashtags.join(","),
            mention_count: record.mentions.len(),
            tweet_url: record.url(),
        }
    }
}

/// Write one row per record.
pub fn export_csv(records: &[Record], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    for record in records {
        writer.serialize(LikeRow::from(record))?;
    }

    writer.flush()?;
    tracing::debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
