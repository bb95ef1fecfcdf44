//! Rate-limit window tracking.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;

/// Quota window length published by the API.
pub const WINDOW_LENGTH: Duration = Duration::from_secs(15 * 60);

/// Slack added on top of the reset time.
pub const RESET_BUFFER: Duration = Duration::from_secs(5);

/// Remaining requests at or below which the engine pauses.
pub const SAFETY_THRESHOLD: u32 = 1;

const LIMIT_HEADER: &str = "x-rate-limit-limit";
const REMAINING_HEADER: &str = "x-rate-limit-remaining";
const RESET_HEADER: &str = "x-rate-limit-reset";

/// One observed quota window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitWindow {
    /// Parse the window from response headers. All three headers must be present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| -> Option<i64> {
            headers
                .get(name)?
                .to_str()
                .ok()?
                .trim()
                .parse::<i64>()
                .ok()
        };

        let limit = u32::try_from(read(LIMIT_HEADER)?).ok()?;
        let remaining = u32::try_from(read(REMAINING_HEADER)?).ok()?;
        let reset_at = Utc.timestamp_opt(read(RESET_HEADER)?, 0).single()?;

        Some(Self {
            limit,
            remaining,
            reset_at,
        })
    }
}

/// Most recently observed quota state.
#[derive(Debug, Clone, Default)]
pub struct RateLimitTracker {
    window: Option<RateLimitWindow>,
    /// The current window has already been waited out.
    waited: bool,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest window. Call after every response carrying rate-limit headers.
    pub fn observe(&mut self, limit: u32, remaining: u32, reset_at: DateTime<Utc>) {
        self.window = Some(RateLimitWindow {
            limit,
            remaining,
            reset_at,
        });
        self.waited = false;
    }

    /// Record a window if one was parsed; keep the previous state otherwise.
    pub fn observe_window(&mut self, window: Option<RateLimitWindow>) {
        if let Some(w) = window {
            self.observe(w.limit, w.remaining, w.reset_at);
        }
    }

    /// Last observed window, if any.
    pub fn window(&self) -> Option<&RateLimitWindow> {
        self.window.as_ref()
    }

    /// True when the remaining quota is known, exhausted, and not yet waited out.
    ///
    /// A window only describes the quota right after the response that
    /// carried it, so once [`mark_waited`](Self::mark_waited) is called it no
    /// longer asks for a wait until a fresh window is observed.
    pub fn should_wait(&self) -> bool {
        !self.waited
            && self
                .window
                .map(|w| w.remaining <= SAFETY_THRESHOLD)
                .unwrap_or(false)
    }

    /// Record that the caller has waited for the current window to reset.
    pub fn mark_waited(&mut self) {
        self.waited = true;
    }

    /// Time until the window resets, measured from now.
    pub fn wait_duration(&self) -> Duration {
        self.wait_duration_at(Utc::now())
    }

    /// Time until the window resets, measured from `now`.
    pub fn wait_duration_at(&self, now: DateTime<Utc>) -> Duration {
        match self.window {
            Some(w) => wait_until(w.reset_at, now),
            None => Duration::ZERO,
        }
    }
}

/// Clamped wait from `now` to `reset_at`, including the reset buffer.
pub fn wait_until(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let ceiling = WINDOW_LENGTH + RESET_BUFFER;
    match (reset_at - now).to_std() {
        Ok(delta) => (delta + RESET_BUFFER).min(ceiling),
        // Reset already passed.
        Err(_) => Duration::ZERO,
    }
}

/// Backoff used when a transient failure carries no rate-limit window.
///
/// Doubles per attempt (1-indexed) and shares the window ceiling.
pub fn fallback_backoff(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(WINDOW_LENGTH + RESET_BUFFER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(limit: &str, remaining: &str, reset: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(LIMIT_HEADER, HeaderValue::from_str(limit).unwrap());
        h.insert(REMAINING_HEADER, HeaderValue::from_str(remaining).unwrap());
        h.insert(RESET_HEADER, HeaderValue::from_str(reset).unwrap());
        h
    }

    #[test]
    fn test_window_from_headers() {
        let w = RateLimitWindow::from_headers(&headers("500", "499", "1700000000")).unwrap();
        assert_eq!(w.limit, 500);
        assert_eq!(w.remaining, 499);
        assert_eq!(w.reset_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_window_requires_all_headers() {
        let mut h = headers("500", "499", "1700000000");
        h.remove(RESET_HEADER);
        assert!(RateLimitWindow::from_headers(&h).is_none());
        assert!(RateLimitWindow::from_headers(&headers("500", "-1", "1")).is_none());
        assert!(RateLimitWindow::from_headers(&headers("x", "1", "1")).is_none());
    }

    #[test]
    fn test_unknown_state_never_waits() {
        let tracker = RateLimitTracker::new();
        assert!(!tracker.should_wait());
        assert_eq!(tracker.wait_duration(), Duration::ZERO);
    }

    #[test]
    fn test_should_wait_threshold() {
        let mut tracker = RateLimitTracker::new();
        let reset = Utc::now();
        tracker.observe(500, 2, reset);
        assert!(!tracker.should_wait());
        tracker.observe(500, 1, reset);
        assert!(tracker.should_wait());
        tracker.observe(500, 0, reset);
        assert!(tracker.should_wait());
    }

    #[test]
    fn test_missing_window_keeps_previous_state() {
        let mut tracker = RateLimitTracker::new();
        tracker.observe(500, 1, Utc::now());
        tracker.observe_window(None);
        assert!(tracker.should_wait());
        assert_eq!(tracker.window().unwrap().remaining, 1);
    }

    #[test]
    fn test_waited_window_is_consumed_until_next_observation() {
        let mut tracker = RateLimitTracker::new();
        let reset = Utc::now() + chrono::Duration::seconds(60);
        tracker.observe(500, 0, reset);
        assert!(tracker.should_wait());

        tracker.mark_waited();
        assert!(!tracker.should_wait());
        // Header-less responses leave the consumed window alone.
        tracker.observe_window(None);
        assert!(!tracker.should_wait());
        assert_eq!(tracker.window().unwrap().remaining, 0);

        tracker.observe(500, 1, reset);
        assert!(tracker.should_wait());
    }

    #[test]
    fn test_wait_duration_includes_buffer() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut tracker = RateLimitTracker::new();
        tracker.observe(500, 0, now + chrono::Duration::seconds(60));
        assert_eq!(tracker.wait_duration_at(now), Duration::from_secs(65));
    }

    #[test]
    fn test_wait_duration_clamped() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut tracker = RateLimitTracker::new();

        // Reset in the past
        tracker.observe(500, 0, now - chrono::Duration::seconds(30));
        assert_eq!(tracker.wait_duration_at(now), Duration::ZERO);

        // Clock skew pushing reset hours out
        tracker.observe(500, 0, now + chrono::Duration::hours(6));
        assert_eq!(tracker.wait_duration_at(now), WINDOW_LENGTH + RESET_BUFFER);
    }

    #[test]
    fn test_fallback_backoff_doubles_and_caps() {
        let base = Duration::from_secs(30);
        assert_eq!(fallback_backoff(base, 1), Duration::from_secs(30));
        assert_eq!(fallback_backoff(base, 2), Duration::from_secs(60));
        assert_eq!(fallback_backoff(base, 3), Duration::from_secs(120));
        assert_eq!(fallback_backoff(base, 20), WINDOW_LENGTH + RESET_BUFFER);
    }
}
