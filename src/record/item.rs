//! Liked post representation.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Timestamp format used by the API (`Sun Nov 09 11:05:17 +0000 2025`).
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Kind of attached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
    Unknown,
}

impl MediaKind {
    /// Map the API's `type` field.
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "photo" => MediaKind::Photo,
            "video" => MediaKind::Video,
            "animated_gif" => MediaKind::AnimatedGif,
            _ => MediaKind::Unknown,
        }
    }

    /// Label used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::AnimatedGif => "animated_gif",
            MediaKind::Unknown => "unknown",
        }
    }

    /// Extension used when neither the URL nor the response reveals one.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Photo | MediaKind::Unknown => "jpg",
            MediaKind::Video => "mp4",
            MediaKind::AnimatedGif => "gif",
        }
    }
}

/// Download state of a media reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Download was not requested for this run.
    #[default]
    NotRequested,
    /// Stored locally at `MediaRef::local_path`.
    Downloaded,
    /// Download attempted and failed.
    Failed(String),
    /// Requested but never started (run cancelled).
    NotDownloaded,
}

/// One media attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Short t.co link shown in the text.
    pub url: String,
    /// Direct media URL (image, or poster frame for video).
    pub media_url: Option<String>,
    /// Best playable variant for videos and GIFs.
    pub video_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub local_path: Option<String>,
    #[serde(default)]
    pub download: DownloadStatus,
}

impl MediaRef {
    /// URL to fetch when downloading.
    pub fn download_url(&self) -> Option<&str> {
        match self.kind {
            MediaKind::Video | MediaKind::AnimatedGif => self
                .video_url
                .as_deref()
                .or(self.media_url.as_deref()),
            MediaKind::Photo | MediaKind::Unknown => self.media_url.as_deref(),
        }
        .or(Some(self.url.as_str()).filter(|u| !u.is_empty()))
    }

    pub fn is_downloaded(&self) -> bool {
        self.download == DownloadStatus::Downloaded && self.local_path.is_some()
    }
}

/// Author of a post.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub screen_name: String,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub verified: bool,
    pub followers_count: Option<u64>,
    pub following_count: Option<u64>,
}

/// Engagement counters. `None` means the API did not report the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub reply_count: Option<u64>,
    pub retweet_count: Option<u64>,
    pub favorite_count: Option<u64>,
    pub quote_count: Option<u64>,
    pub view_count: Option<u64>,
}

/// One normalized liked post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub text: String,
    pub created_at: String,
    pub user: Author,
    #[serde(flatten)]
    pub engagement: Engagement,
    pub lang: Option<String>,
    pub is_retweet: bool,
    pub is_quote: bool,
    pub media: Vec<MediaRef>,
    pub urls: Vec<String>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub conversation_id: Option<String>,
    pub in_reply_to_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl Record {
    /// Permalink to the post.
    pub fn url(&self) -> String {
        format!("https://x.com/{}/status/{}", self.user.screen_name, self.id)
    }

    /// Parse `created_at` into an absolute instant.
    pub fn created_datetime(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT).ok()
    }

    /// `YYYY-MM` bucket of the creation date.
    pub fn year_month(&self) -> Option<String> {
        self.created_datetime()
            .map(|dt| dt.format("%Y-%m").to_string())
    }

    /// Copy of the record without the raw API payload.
    pub fn without_raw(&self) -> Record {
        Record {
            raw: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal record for tests.
    pub fn record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            text: format!("post {}", id),
            created_at: "Sun Nov 09 11:05:17 +0000 2025".to_string(),
            user: Author {
                id: "42".to_string(),
                screen_name: "someone".to_string(),
                name: "Some One".to_string(),
                ..Default::default()
            },
            engagement: Engagement::default(),
            lang: Some("en".to_string()),
            is_retweet: false,
            is_quote: false,
            media: Vec::new(),
            urls: Vec::new(),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            conversation_id: None,
            in_reply_to_user_id: None,
            raw: None,
        }
    }

    pub fn photo(url: &str) -> MediaRef {
        MediaRef {
            kind: MediaKind::Photo,
            url: "https://t.co/abc".to_string(),
            media_url: Some(url.to_string()),
            video_url: None,
            width: Some(1200),
            height: Some(800),
            local_path: None,
            download: DownloadStatus::NotRequested,
        }
    }
}
