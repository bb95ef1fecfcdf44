//! API response type definitions.
//!
//! The Likes timeline is a deeply nested GraphQL envelope. Only the path down
//! to the timeline instructions is typed strictly; individual entries are kept
//! as JSON and classified into [`TimelineEntry`] variants.

use serde::Deserialize;
use serde_json::Value;

/// Instruction that appends entries to the timeline.
pub const ADD_ENTRIES: &str = "TimelineAddEntries";

/// Instruction that replaces a single entry (used for cursor refreshes).
pub const REPLACE_ENTRY: &str = "TimelineReplaceEntry";

/// Top-level GraphQL response.
#[derive(Debug, Default, Deserialize)]
pub struct LikesResponse {
    #[serde(default)]
    pub data: Option<LikesData>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

/// GraphQL error object.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LikesData {
    #[serde(default)]
    pub user: Option<UserEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub result: Option<UserTimelineResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserTimelineResult {
    #[serde(default)]
    pub timeline: Option<TimelineWrapper>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineWrapper {
    #[serde(default)]
    pub timeline: Option<Timeline>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// Timeline instruction envelope.
#[derive(Debug, Deserialize)]
pub struct Instruction {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
    #[serde(default)]
    pub entry: Option<RawEntry>,
}

/// Entry as delivered inside an instruction.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    #[serde(rename = "entryId", default)]
    pub entry_id: String,
    #[serde(default)]
    pub content: Value,
}

/// Classified timeline entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    /// A post; holds the `tweet_results.result` object.
    Post(Value),
    /// Pagination marker.
    Cursor { cursor_type: String, value: String },
    /// Anything else (promoted content, modules, placeholders).
    Other,
}

impl TimelineEntry {
    /// Classify one raw entry.
    pub fn classify(entry: RawEntry) -> Self {
        let RawEntry {
            entry_id,
            mut content,
        } = entry;

        let entry_type = content
            .get("entryType")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match entry_type.as_deref() {
            Some("TimelineTimelineItem") => {
                let item = content
                    .get_mut("itemContent")
                    .map(Value::take)
                    .unwrap_or(Value::Null);
                if entry_id.starts_with("promoted") || item.get("promotedMetadata").is_some() {
                    return TimelineEntry::Other;
                }
                match item.pointer("/tweet_results/result") {
                    Some(result) if result.is_object() => TimelineEntry::Post(result.clone()),
                    _ => TimelineEntry::Other,
                }
            }
            Some("TimelineTimelineCursor") => {
                let cursor_type = content
                    .get("cursorType")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let value = content
                    .get("value")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                TimelineEntry::Cursor { cursor_type, value }
            }
            _ => TimelineEntry::Other,
        }
    }
}

/// One page of the Likes timeline after envelope unwrapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikesPage {
    /// Raw post results in timeline order.
    pub posts: Vec<Value>,
    /// Bottom cursor, if the page advertised one.
    pub next_cursor: Option<String>,
}

impl LikesPage {
    /// Unwrap instructions into post entries and the bottom cursor.
    pub fn from_response(response: LikesResponse) -> Self {
        let instructions = response
            .data
            .and_then(|d| d.user)
            .and_then(|u| u.result)
            .and_then(|r| r.timeline)
            .and_then(|t| t.timeline)
            .map(|t| t.instructions)
            .unwrap_or_default();

        let mut page = LikesPage::default();

        for instruction in instructions {
            let entries: Vec<RawEntry> = match instruction.kind.as_str() {
                ADD_ENTRIES => instruction.entries,
                REPLACE_ENTRY => instruction.entry.into_iter().collect(),
                _ => continue,
            };

            for entry in entries {
                match TimelineEntry::classify(entry) {
                    TimelineEntry::Post(result) => page.posts.push(result),
                    TimelineEntry::Cursor { cursor_type, value } if cursor_type == "Bottom" => {
                        page.next_cursor = Some(value).filter(|v| !v.is_empty());
                    }
                    TimelineEntry::Cursor { .. } | TimelineEntry::Other => {}
                }
            }
        }

        page
    }
}

/// Typed view of a `tweet_results.result` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetResult {
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    #[serde(default)]
    pub rest_id: Option<String>,
    #[serde(default)]
    pub core: Option<TweetCore>,
    #[serde(default)]
    pub legacy: Option<TweetLegacy>,
    #[serde(default)]
    pub views: Option<TweetViews>,
    #[serde(default)]
    pub note_tweet: Option<NoteTweet>,
    #[serde(default)]
    pub quoted_status_result: Option<Value>,
    /// Present on `TweetWithVisibilityResults`.
    #[serde(default)]
    pub tweet: Option<Box<TweetResult>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetCore {
    #[serde(default)]
    pub user_results: Option<UserResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserResults {
    #[serde(default)]
    pub result: Option<UserResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserResult {
    #[serde(default)]
    pub rest_id: Option<String>,
    #[serde(default)]
    pub is_blue_verified: Option<bool>,
    #[serde(default)]
    pub legacy: Option<UserLegacy>,
    /// Newer responses move names here.
    #[serde(default)]
    pub core: Option<UserCore>,
    #[serde(default)]
    pub avatar: Option<UserAvatar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLegacy {
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub friends_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserCore {
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAvatar {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetLegacy {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub retweet_count: Option<u64>,
    #[serde(default)]
    pub favorite_count: Option<u64>,
    #[serde(default)]
    pub quote_count: Option<u64>,
    #[serde(default)]
    pub conversation_id_str: Option<String>,
    #[serde(default)]
    pub in_reply_to_user_id_str: Option<String>,
    #[serde(default)]
    pub retweeted_status_result: Option<Value>,
    #[serde(default)]
    pub entities: Option<TweetEntities>,
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetEntities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
    #[serde(default)]
    pub hashtags: Vec<HashtagEntity>,
    #[serde(default)]
    pub user_mentions: Vec<MentionEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlEntity {
    #[serde(default)]
    pub expanded_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub indices: Vec<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HashtagEntity {
    pub text: String,
    #[serde(default)]
    pub indices: Vec<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MentionEntity {
    pub screen_name: String,
    #[serde(default)]
    pub indices: Vec<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaEntity {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_url_https: Option<String>,
    #[serde(default)]
    pub original_info: Option<OriginalInfo>,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OriginalInfo {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoVariant {
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetViews {
    #[serde(default)]
    pub count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteTweet {
    #[serde(default)]
    pub note_tweet_results: Option<NoteTweetResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteTweetResults {
    #[serde(default)]
    pub result: Option<NoteTweetResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteTweetResult {
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(entries: Value) -> LikesResponse {
        serde_json::from_value(json!({
            "data": {"user": {"result": {"timeline": {"timeline": {"instructions": [
                {"type": "TimelineClearCache"},
                {"type": "TimelineAddEntries", "entries": entries}
            ]}}}}}
        }))
        .unwrap()
    }

    fn post_entry(id: &str) -> Value {
        json!({
            "entryId": format!("tweet-{id}"),
            "content": {
                "entryType": "TimelineTimelineItem",
                "itemContent": {"tweet_results": {"result": {"__typename": "Tweet", "rest_id": id}}}
            }
        })
    }

    fn cursor_entry(kind: &str, value: &str) -> Value {
        json!({
            "entryId": format!("cursor-{}-1", kind.to_lowercase()),
            "content": {"entryType": "TimelineTimelineCursor", "cursorType": kind, "value": value}
        })
    }

    #[test]
    fn test_page_extracts_posts_and_bottom_cursor() {
        let page = LikesPage::from_response(response(json!([
            post_entry("1"),
            post_entry("2"),
            cursor_entry("Top", "top-cursor"),
            cursor_entry("Bottom", "bottom-cursor"),
        ])));

        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0]["rest_id"], "1");
        assert_eq!(page.next_cursor.as_deref(), Some("bottom-cursor"));
    }

    #[test]
    fn test_promoted_entries_are_filtered() {
        let mut promoted = post_entry("9");
        promoted["entryId"] = json!("promoted-tweet-9");
        let mut with_metadata = post_entry("10");
        with_metadata["content"]["itemContent"]["promotedMetadata"] = json!({"advertiser": {}});

        let page = LikesPage::from_response(response(json!([
            promoted,
            with_metadata,
            post_entry("11")
        ])));
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0]["rest_id"], "11");
    }

    #[test]
    fn test_replace_entry_cursor() {
        let resp: LikesResponse = serde_json::from_value(json!({
            "data": {"user": {"result": {"timeline": {"timeline": {"instructions": [
                {"type": "TimelineReplaceEntry", "entry": cursor_entry("Bottom", "replaced")}
            ]}}}}}
        }))
        .unwrap();
        let page = LikesPage::from_response(resp);
        assert!(page.posts.is_empty());
        assert_eq!(page.next_cursor.as_deref(), Some("replaced"));
    }

    #[test]
    fn test_missing_envelope_yields_empty_page() {
        let resp: LikesResponse = serde_json::from_value(json!({"data": {"user": {}}})).unwrap();
        assert_eq!(LikesPage::from_response(resp), LikesPage::default());
    }

    #[test]
    fn test_empty_bottom_cursor_is_none() {
        let page = LikesPage::from_response(response(json!([cursor_entry("Bottom", "")])));
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_classify_unknown_entry() {
        let entry: RawEntry = serde_json::from_value(json!({
            "entryId": "who-to-follow-1",
            "content": {"entryType": "TimelineTimelineModule"}
        }))
        .unwrap();
        assert_eq!(TimelineEntry::classify(entry), TimelineEntry::Other);
    }
}
