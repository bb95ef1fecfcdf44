//! X web API HTTP client.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::json;
use tokio::sync::RwLock;

use crate::api::auth::CredentialContext;
use crate::api::rate_limit::RateLimitWindow;
use crate::api::types::{LikesPage, LikesResponse};
use crate::error::{Error, Result};

/// X web base URL.
pub const API_BASE: &str = "https://x.com";

/// GraphQL operation name for the liked-posts timeline.
pub const LIKES_OPERATION: &str = "Likes";

/// Largest page the Likes operation accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default browser user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Feature switches the Likes operation insists on receiving.
const FEATURES: &[(&str, bool)] = &[
    ("rweb_tipjar_consumption_enabled", true),
    ("responsive_web_graphql_exclude_directive_enabled", true),
    ("verified_phone_label_enabled", false),
    ("creator_subscriptions_tweet_preview_api_enabled", true),
    ("responsive_web_graphql_timeline_navigation_enabled", true),
    ("responsive_web_graphql_skip_user_profile_image_extensions_enabled", false),
    ("communities_web_enable_tweet_community_results_fetch", true),
    ("c9s_tweet_anatomy_moderator_badge_enabled", true),
    ("articles_preview_enabled", true),
    ("responsive_web_edit_tweet_api_enabled", true),
    ("graphql_is_translatable_rweb_tweet_is_translatable_enabled", true),
    ("view_counts_everywhere_api_enabled", true),
    ("longform_notetweets_consumption_enabled", true),
    ("responsive_web_twitter_article_tweet_consumption_enabled", true),
    ("tweet_awards_web_tipping_enabled", false),
    ("creator_subscriptions_quote_tweet_preview_enabled", false),
    ("freedom_of_speech_not_reach_fetch_enabled", true),
    ("standardized_nudges_misinfo", true),
    ("tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled", true),
    ("rweb_video_timestamps_enabled", true),
    ("longform_notetweets_rich_text_read_enabled", true),
    ("longform_notetweets_inline_media_enabled", true),
    ("responsive_web_enhance_cards_enabled", false),
    ("responsive_web_grok_analyze_post_followups_enabled", false),
    ("responsive_web_grok_imagine_annotation_enabled", false),
    ("premium_content_api_read_enabled", false),
    ("responsive_web_grok_analysis_button_from_backend", false),
    ("responsive_web_profile_redirect_enabled", false),
    ("responsive_web_grok_share_attachment_enabled", false),
    ("responsive_web_grok_show_grok_translated_post", false),
    ("profile_label_improvements_pcf_label_in_post_enabled", false),
    ("payments_enabled", false),
    ("rweb_video_screen_enabled", false),
    ("responsive_web_jetfuel_frame", false),
    ("responsive_web_grok_community_note_auto_translation_is_enabled", false),
    ("responsive_web_grok_image_annotation_enabled", false),
    ("responsive_web_grok_analyze_button_fetch_trends_enabled", false),
];

/// Connection settings for [`XApi`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub user_agent: String,
    /// Fixed GraphQL query id; discovered from the web client when `None`.
    pub query_id: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            query_id: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A successfully fetched page plus the quota it reported.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub page: LikesPage,
    pub rate_limit: Option<RateLimitWindow>,
}

/// Authenticated client for the Likes timeline.
pub struct XApi {
    client: Client,
    credentials: CredentialContext,
    base_url: String,
    query_id: Arc<RwLock<Option<String>>>,
}

impl XApi {
    /// Create a new API client. No request is made until the first fetch.
    pub fn new(credentials: CredentialContext, options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            query_id: Arc::new(RwLock::new(options.query_id)),
        })
    }

    /// Session credentials in use.
    pub fn credentials(&self) -> &CredentialContext {
        &self.credentials
    }

    /// GraphQL query id for the Likes operation, discovering it on first use.
    pub async fn query_id(&self) -> Result<String> {
        if let Some(id) = self.query_id.read().await.clone() {
            return Ok(id);
        }

        let mut slot = self.query_id.write().await;
        if let Some(id) = slot.clone() {
            return Ok(id);
        }

        let id = self.discover_query_id(LIKES_OPERATION).await?;
        tracing::info!("Discovered {} query id: {}", LIKES_OPERATION, id);
        *slot = Some(id.clone());
        Ok(id)
    }

    /// Scrape the web client bundle for an operation's query id.
    async fn discover_query_id(&self, operation: &str) -> Result<String> {
        let home_url = format!("{}/home", self.base_url);
        tracing::debug!("GET {}", home_url);

        let html = self
            .client
            .get(&home_url)
            .headers(self.credentials.headers()?)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let script_url = find_main_script(&html).ok_or_else(|| {
            Error::Api("Failed to find the web client script in the home page".into())
        })?;
        tracing::debug!("GET {}", script_url);

        let script = self
            .client
            .get(&script_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        find_query_id(&script, operation)
            .ok_or_else(|| Error::Api(format!("Failed to extract query id for {}", operation)))
    }

    /// Fetch one page of liked posts.
    pub async fn fetch_likes_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        count: u32,
    ) -> Result<PageResponse> {
        let query_id = self.query_id().await?;
        let url = format!(
            "{}/i/api/graphql/{}/{}",
            self.base_url, query_id, LIKES_OPERATION
        );

        let variables = likes_variables(user_id, cursor, count.min(MAX_PAGE_SIZE));
        let features = features_json();

        tracing::debug!("GET {} cursor={:?}", url, cursor);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("variables", variables.to_string()),
                ("features", features.to_string()),
            ])
            .headers(self.credentials.headers()?)
            .send()
            .await?;

        let response = check_status(response).await?;
        let rate_limit = RateLimitWindow::from_headers(response.headers());
        let text = response.text().await?;
        tracing::debug!("Likes response length: {} bytes", text.len());

        let parsed: LikesResponse = serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse likes: {} - Response: {}",
                e,
                &text[..floor_char_boundary(&text, 500)]
            ))
        })?;

        if parsed.data.is_none() && !parsed.errors.is_empty() {
            let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(Error::Api(format!("GraphQL error: {}", messages.join("; "))));
        }

        Ok(PageResponse {
            page: LikesPage::from_response(parsed),
            rate_limit,
        })
    }

    /// Underlying HTTP client, shared with the media downloader.
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}

/// Fetch a file with a plain client, failing on non-success status.
pub async fn download_file(client: &Client, url: &str) -> Result<Response> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(Error::Download(format!(
            "Failed to download file: HTTP {}",
            response.status()
        )));
    }

    Ok(response)
}

/// Map HTTP status to the error taxonomy.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("Response status: {}", status);

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let window = RateLimitWindow::from_headers(response.headers());
        return Err(Error::RateLimited { window });
    }

    let body = response.text().await.unwrap_or_default();
    let snippet = &body[..floor_char_boundary(&body, 300)];

    if status.is_server_error() {
        return Err(Error::Transient(format!("HTTP {}: {}", status, snippet)));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::error!("Auth error response: {}", snippet);
        return Err(Error::Authentication(format!(
            "HTTP {}: {}",
            status,
            if snippet.is_empty() {
                "check that your cookies are current"
            } else {
                snippet
            }
        )));
    }

    Err(Error::Api(format!("HTTP {}: {}", status, snippet)))
}

fn likes_variables(user_id: &str, cursor: Option<&str>, count: u32) -> serde_json::Value {
    let mut variables = json!({
        "userId": user_id,
        "count": count,
        "includePromotedContent": false,
        "withClientEventToken": false,
        "withBirdwatchNotes": false,
        "withVoice": true,
        "withV2Timeline": true
    });
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        variables["cursor"] = json!(cursor);
    }
    variables
}

fn features_json() -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = FEATURES
        .iter()
        .map(|(name, enabled)| (name.to_string(), json!(enabled)))
        .collect();
    serde_json::Value::Object(map)
}

/// Locate the `main.<hash>.js` web client bundle in the home page.
pub fn find_main_script(html: &str) -> Option<String> {
    let pattern =
        Regex::new(r#"(?:src|href)="([^"]*/responsive-web/client-web/main\.[^"]+\.js)""#).ok()?;
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the query id registered for `operation` in the client bundle.
pub fn find_query_id(script: &str, operation: &str) -> Option<String> {
    let pattern = Regex::new(&format!(
        r#"queryId:"([^"]+)",operationName:"{}""#,
        regex::escape(operation)
    ))
    .ok()?;
    pattern
        .captures(script)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Largest byte index `<= max` that falls on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_first_page_has_no_cursor() {
        let vars = likes_variables("123", None, 20);
        assert_eq!(vars["userId"], "123");
        assert_eq!(vars["count"], 20);
        assert!(vars.get("cursor").is_none());

        let vars = likes_variables("123", Some(""), 20);
        assert!(vars.get("cursor").is_none());
    }

    #[test]
    fn test_variables_with_cursor() {
        let vars = likes_variables("123", Some("DAABCgAB"), 20);
        assert_eq!(vars["cursor"], "DAABCgAB");
        assert_eq!(vars["includePromotedContent"], false);
    }

    #[test]
    fn test_features_object() {
        let features = features_json();
        assert_eq!(features["view_counts_everywhere_api_enabled"], true);
        assert_eq!(features["payments_enabled"], false);
        assert_eq!(features.as_object().unwrap().len(), FEATURES.len());
    }

    #[test]
    fn test_find_main_script() {
        let html = r#"<link rel="preload" as="script" crossorigin="anonymous" href="https://abs.twimg.com/responsive-web/client-web/main.4a5f6b7c.js" nonce="x"/>"#;
        assert_eq!(
            find_main_script(html).as_deref(),
            Some("https://abs.twimg.com/responsive-web/client-web/main.4a5f6b7c.js")
        );
        assert!(find_main_script("<html></html>").is_none());
    }

    #[test]
    fn test_find_query_id() {
        let script = r#"e.exports={queryId:"abc",operationName:"Bookmarks"};e.exports={queryId:"q1w2e3",operationName:"Likes",operationType:"query"}"#;
        assert_eq!(find_query_id(script, "Likes").as_deref(), Some("q1w2e3"));
        assert!(find_query_id(script, "Followers").is_none());
    }

    #[test]
    fn test_floor_char_boundary() {
        assert_eq!(floor_char_boundary("héllo", 2), 1);
        assert_eq!(floor_char_boundary("abc", 10), 3);
    }
}
