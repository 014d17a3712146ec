use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

struct Window {
    started: DateTime<Utc>,
    count: u32,
}

/// Fixed-window request counter keyed by `(client, route)`.
///
/// An elapsed window is replaced outright, not decayed. Counters live in
/// memory only and reset on restart; they mitigate abuse, they are not
/// correctness-critical state.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    slots: Mutex<HashMap<(IpAddr, &'static str), Window>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Records one request. Returns the retry-after hint (the window size)
    /// when the client is over budget.
    pub async fn check(
        &self,
        client: IpAddr,
        route: &'static str,
        now: DateTime<Utc>,
    ) -> Result<(), Duration> {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry((client, route)).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.signed_duration_since(slot.started);
        if elapsed.num_milliseconds() >= self.window.as_millis() as i64 {
            slot.started = now;
            slot.count = 0;
        }

        slot.count = slot.count.saturating_add(1);
        if slot.count > self.max {
            return Err(self.window);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client() -> IpAddr {
        "203.0.113.9".parse().unwrap()
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn second_request_in_window_is_rejected() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check(client(), "action", start()).await.is_ok());
        let retry = limiter
            .check(client(), "action", start() + chrono::Duration::seconds(1))
            .await
            .unwrap_err();
        assert_eq!(retry, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn window_resets_by_replacement() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check(client(), "action", start()).await.is_ok());
        assert!(limiter
            .check(client(), "action", start() + chrono::Duration::seconds(61))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn routes_are_counted_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check(client(), "action", start()).await.is_ok());
        assert!(limiter.check(client(), "dashboard", start()).await.is_ok());
    }
}
