//! Normalization of raw post results into [`Record`]s.

use serde_json::Value;

use crate::api::types::{MediaEntity, TweetEntities, TweetResult, UserResult};
use crate::record::item::{Author, DownloadStatus, Engagement, MediaKind, MediaRef, Record};

/// Why a raw entry could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Payload did not match the post shape at all.
    Malformed(String),
    /// Tombstone or unavailable post (no `legacy` block).
    Unavailable(Option<String>),
    /// Post without an identifier.
    MissingId,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Malformed(e) => write!(f, "malformed post payload: {}", e),
            SkipReason::Unavailable(Some(kind)) => write!(f, "post unavailable ({})", kind),
            SkipReason::Unavailable(None) => write!(f, "post unavailable"),
            SkipReason::MissingId => write!(f, "post has no identifier"),
        }
    }
}

/// Normalize one `tweet_results.result` object.
///
/// `keep_raw` retains the original JSON on the record.
pub fn parse_record(raw: &Value, keep_raw: bool) -> Result<Record, SkipReason> {
    let result: TweetResult =
        serde_json::from_value(raw.clone()).map_err(|e| SkipReason::Malformed(e.to_string()))?;

    // Visibility-limited posts wrap the actual post one level down.
    let tweet = match result {
        TweetResult {
            legacy: None,
            tweet: Some(inner),
            ..
        } => *inner,
        other => other,
    };

    let Some(legacy) = tweet.legacy.as_ref() else {
        return Err(SkipReason::Unavailable(tweet.typename.clone()));
    };

    let id = tweet
        .rest_id
        .clone()
        .or_else(|| legacy.id_str.clone())
        .filter(|id| !id.is_empty())
        .ok_or(SkipReason::MissingId)?;

    let user = tweet
        .core
        .as_ref()
        .and_then(|c| c.user_results.as_ref())
        .and_then(|u| u.result.as_ref())
        .map(parse_author)
        .unwrap_or_default();

    let text = tweet
        .note_tweet
        .as_ref()
        .and_then(|n| n.note_tweet_results.as_ref())
        .and_then(|r| r.result.as_ref())
        .and_then(|r| r.text.clone())
        .or_else(|| legacy.full_text.clone())
        .unwrap_or_default();

    let view_count = tweet
        .views
        .as_ref()
        .and_then(|v| v.count.as_deref())
        .and_then(|c| c.parse::<u64>().ok());

    let media: Vec<MediaRef> = legacy
        .extended_entities
        .as_ref()
        .map(|e| e.media.iter().map(parse_media).collect())
        .unwrap_or_default();

    let (urls, hashtags, mentions) = legacy
        .entities
        .as_ref()
        .map(parse_entities)
        .unwrap_or_default();

    Ok(Record {
        id,
        text,
        created_at: legacy.created_at.clone().unwrap_or_default(),
        user,
        engagement: Engagement {
            reply_count: legacy.reply_count,
            retweet_count: legacy.retweet_count,
            favorite_count: legacy.favorite_count,
            quote_count: legacy.quote_count,
            view_count,
        },
        lang: legacy.lang.clone(),
        is_retweet: legacy.retweeted_status_result.is_some(),
        is_quote: tweet.quoted_status_result.is_some(),
        media,
        urls,
        hashtags,
        mentions,
        conversation_id: legacy.conversation_id_str.clone(),
        in_reply_to_user_id: legacy.in_reply_to_user_id_str.clone(),
        raw: keep_raw.then(|| raw.clone()),
    })
}

fn parse_author(user: &UserResult) -> Author {
    let legacy = user.legacy.as_ref();
    let core = user.core.as_ref();

    let screen_name = legacy
        .and_then(|l| l.screen_name.clone())
        .or_else(|| core.and_then(|c| c.screen_name.clone()))
        .unwrap_or_default();
    let name = legacy
        .and_then(|l| l.name.clone())
        .or_else(|| core.and_then(|c| c.name.clone()))
        .unwrap_or_default();

    Author {
        id: user.rest_id.clone().unwrap_or_default(),
        screen_name,
        name,
        profile_image_url: legacy
            .and_then(|l| l.profile_image_url_https.clone())
            .or_else(|| user.avatar.as_ref().and_then(|a| a.image_url.clone())),
        verified: user.is_blue_verified.unwrap_or(false)
            || legacy.and_then(|l| l.verified).unwrap_or(false),
        followers_count: legacy.and_then(|l| l.followers_count),
        following_count: legacy.and_then(|l| l.friends_count),
    }
}

fn parse_media(entity: &MediaEntity) -> MediaRef {
    let kind = MediaKind::from_api(entity.kind.as_deref().unwrap_or("photo"));

    // Highest-bitrate mp4 wins; HLS playlists carry no bitrate.
    let video_url = entity.video_info.as_ref().and_then(|info| {
        info.variants
            .iter()
            .filter(|v| v.content_type.as_deref() == Some("video/mp4"))
            .max_by_key(|v| v.bitrate.unwrap_or(0))
            .and_then(|v| v.url.clone())
    });

    MediaRef {
        kind,
        url: entity.url.clone().unwrap_or_default(),
        media_url: entity.media_url_https.clone(),
        video_url,
        width: entity.original_info.as_ref().and_then(|o| o.width),
        height: entity.original_info.as_ref().and_then(|o| o.height),
        local_path: None,
        download: DownloadStatus::NotRequested,
    }
}

/// URLs, hashtags and mentions, each in text order.
fn parse_entities(entities: &TweetEntities) -> (Vec<String>, Vec<String>, Vec<String>) {
    fn ordered<T>(
        items: &[T],
        start: impl Fn(&T) -> u64,
        value: impl Fn(&T) -> Option<String>,
    ) -> Vec<String> {
        let mut indexed: Vec<(u64, String)> = items
            .iter()
            .filter_map(|item| value(item).map(|v| (start(item), v)))
            .collect();
        // Stable sort keeps API order for entities without indices.
        indexed.sort_by_key(|(start, _)| *start);
        indexed.into_iter().map(|(_, v)| v).collect()
    }

    let urls = ordered(
        &entities.urls,
        |u| u.indices.first().copied().unwrap_or(0),
        |u| u.expanded_url.clone().or_else(|| u.url.clone()),
    );
    let hashtags = ordered(
        &entities.hashtags,
        |h| h.indices.first().copied().unwrap_or(0),
        |h| Some(h.text.clone()),
    );
    let mentions = ordered(
        &entities.user_mentions,
        |m| m.indices.first().copied().unwrap_or(0),
        |m| Some(m.screen_name.clone()),
    );

    (urls, hashtags, mentions)
}


#[cfg(test)]
mod tests {
    use super::fixtures::raw_post;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_record() {
        let record = parse_record(&raw_post("100"), false).unwrap();
        assert_eq!(record.id, "100");
        assert_eq!(record.user.screen_name, "rustlang");
        assert_eq!(record.user.followers_count, Some(100));
        assert_eq!(record.engagement.view_count, Some(1234));
        assert_eq!(record.engagement.quote_count, Some(0));
        assert_eq!(record.hashtags, vec!["rust"]);
        assert_eq!(record.mentions, vec!["ferris"]);
        assert_eq!(record.urls, vec!["https://www.rust-lang.org"]);
        assert!(record.raw.is_none());
        assert!(!record.is_retweet);
    }

    #[test]
    fn test_absent_counters_are_unknown() {
        let mut raw = raw_post("1");
        raw["legacy"].as_object_mut().unwrap().remove("quote_count");
        raw.as_object_mut().unwrap().remove("views");
        let record = parse_record(&raw, false).unwrap();
        assert_eq!(record.engagement.quote_count, None);
        assert_eq!(record.engagement.view_count, None);
    }

    #[test]
    fn test_keep_raw() {
        let raw = raw_post("1");
        let record = parse_record(&raw, true).unwrap();
        assert_eq!(record.raw.as_ref(), Some(&raw));
    }

    #[test]
    fn test_tombstone_is_skipped() {
        let raw = json!({"__typename": "TweetTombstone", "tombstone": {}});
        assert_eq!(
            parse_record(&raw, false),
            Err(SkipReason::Unavailable(Some("TweetTombstone".to_string())))
        );
    }

    #[test]
    fn test_missing_id_is_skipped() {
        let mut raw = raw_post("1");
        raw.as_object_mut().unwrap().remove("rest_id");
        raw["legacy"].as_object_mut().unwrap().remove("id_str");
        assert_eq!(parse_record(&raw, false), Err(SkipReason::MissingId));
    }

    #[test]
    fn test_malformed_payload() {
        let raw = json!({"rest_id": 5, "legacy": "nope"});
        assert!(matches!(
            parse_record(&raw, false),
            Err(SkipReason::Malformed(_))
        ));
    }

    #[test]
    fn test_visibility_wrapper_is_unwrapped() {
        let raw = json!({
            "__typename": "TweetWithVisibilityResults",
            "tweet": raw_post("77")
        });
        let record = parse_record(&raw, false).unwrap();
        assert_eq!(record.id, "77");
    }

    #[test]
    fn test_note_tweet_text_preferred() {
        let mut raw = raw_post("1");
        raw["note_tweet"] = json!({"note_tweet_results": {"result": {"text": "a much longer body"}}});
        let record = parse_record(&raw, false).unwrap();
        assert_eq!(record.text, "a much longer body");
    }

    #[test]
    fn test_author_from_core_names() {
        let mut raw = raw_post("1");
        raw["core"]["user_results"]["result"] = json!({
            "rest_id": "5",
            "is_blue_verified": true,
            "core": {"screen_name": "newshape", "name": "New Shape"},
            "avatar": {"image_url": "https://pbs.twimg.com/a.jpg"}
        });
        let record = parse_record(&raw, false).unwrap();
        assert_eq!(record.user.screen_name, "newshape");
        assert!(record.user.verified);
        assert_eq!(
            record.user.profile_image_url.as_deref(),
            Some("https://pbs.twimg.com/a.jpg")
        );
    }

    #[test]
    fn test_media_parsing() {
        let mut raw = raw_post("1");
        raw["legacy"]["extended_entities"] = json!({"media": [
            {"type": "photo", "url": "https://t.co/p", "media_url_https": "https://pbs.twimg.com/media/a.jpg",
             "original_info": {"width": 800, "height": 600}},
            {"type": "video", "url": "https://t.co/v", "media_url_https": "https://pbs.twimg.com/thumb.jpg",
             "video_info": {"variants": [
                {"content_type": "application/x-mpegURL", "url": "https://video.twimg.com/pl.m3u8"},
                {"content_type": "video/mp4", "bitrate": 256000, "url": "https://video.twimg.com/low.mp4"},
                {"content_type": "video/mp4", "bitrate": 2176000, "url": "https://video.twimg.com/high.mp4"}
             ]}}
        ]});
        let record = parse_record(&raw, false).unwrap();
        assert_eq!(record.media.len(), 2);
        assert_eq!(record.media[0].kind, MediaKind::Photo);
        assert_eq!(record.media[0].width, Some(800));
        assert_eq!(record.media[1].kind, MediaKind::Video);
        assert_eq!(
            record.media[1].video_url.as_deref(),
            Some("https://video.twimg.com/high.mp4")
        );
    }

    #[test]
    fn test_entities_in_text_order() {
        let mut raw = raw_post("1");
        raw["legacy"]["entities"]["hashtags"] = json!([
            {"text": "second", "indices": [20, 27]},
            {"text": "first", "indices": [0, 6]}
        ]);
        let record = parse_record(&raw, false).unwrap();
        assert_eq!(record.hashtags, vec!["first", "second"]);
    }
}
