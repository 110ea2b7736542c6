use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use tokio::sync::Mutex;

#[derive(Debug)]
struct RateLimit {
    remaining: u32,
    reset: i64,
}

/// Header-driven rate limiter shared by all requests of one client.
///
/// State comes from the `x-ratelimit-remaining` / `x-ratelimit-reset`
/// response headers. When the remaining quota drops to the threshold, the
/// next request sleeps until the reported reset plus a one-second margin.
pub(crate) struct RateLimiter {
    threshold: u32,
    state: Mutex<RateLimit>,
}

impl RateLimiter {
    pub(crate) fn new(threshold: u32) -> Self {
        RateLimiter {
            threshold,
            state: Mutex::new(RateLimit {
                remaining: u32::MAX,
                reset: 0,
            }),
        }
    }

    pub(crate) async fn wait(&self) {
        while let Some(delay) = self.time_to_wait().await {
            info!("Rate limit low, waiting {} sec", delay.as_secs());
            tokio::time::sleep(delay).await;
        }
    }

    async fn time_to_wait(&self) -> Option<Duration> {
        let state = self.state.lock().await;
        if state.remaining > self.threshold {
            return None;
        }
        let now = Utc::now().timestamp();
        if state.reset <= now {
            debug!("Rate limit reset time already passed, not waiting");
            return None;
        }
        Some(Duration::from_secs((state.reset - now) as u64 + 1))
    }

    pub(crate) async fn observe(&self, headers: &HeaderMap<HeaderValue>) {
        let remaining = match read_header::<u32>(headers, "x-ratelimit-remaining") {
            Some(remaining) => remaining,
            None => return,
        };
        let reset = match read_header::<i64>(headers, "x-ratelimit-reset") {
            Some(reset) => reset,
            None => return,
        };
        let mut state = self.state.lock().await;
        // A late response from a parallel task may carry stale values: only
        // move the reset forward, and within one reset window only shrink
        // the remaining count.
        if reset > state.reset {
            state.reset = reset;
            state.remaining = remaining;
        } else if reset == state.reset {
            state.remaining = std::cmp::min(state.remaining, remaining);
        }
        debug!("Updated rate limit: {:?}", state);
    }
}

fn read_header<T: FromStr>(headers: &HeaderMap<HeaderValue>, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

#[tokio::test]
async fn waits_until_reset_when_quota_is_low() {
    let limiter = RateLimiter::new(1);

    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("100"));
    let reset = Utc::now().timestamp() + 1;
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from_str(&reset.to_string()).unwrap(),
    );
    limiter.observe(&headers).await;
    let before = Utc::now().timestamp();
    limiter.wait().await;
    assert_eq!(Utc::now().timestamp(), before, "plenty of quota, no wait");

    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("1"));
    limiter.observe(&headers).await;
    limiter.wait().await;
    assert!(
        Utc::now().timestamp() >= reset + 1,
        "quota at threshold should wait past the reset plus margin"
    );

    // after the reset has passed, the stale low quota no longer blocks
    let before = Utc::now().timestamp();
    limiter.wait().await;
    assert_eq!(Utc::now().timestamp(), before);
}

#[tokio::test]
async fn stale_headers_do_not_raise_the_quota() {
    let limiter = RateLimiter::new(1);
    let reset = (Utc::now().timestamp() + 3600).to_string();

    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("5"));
    headers.insert("x-ratelimit-reset", HeaderValue::from_str(&reset).unwrap());
    limiter.observe(&headers).await;

    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("50"));
    limiter.observe(&headers).await;
    let state = limiter.state.lock().await;
    assert_eq!(state.remaining, 5, "same reset window keeps the lower count");
}
