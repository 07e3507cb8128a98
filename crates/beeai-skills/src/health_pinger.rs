//! Keeps the remote chat function warm with periodic `GET /api/health` calls.
//! Results are ignored apart from a debug log line.

use beeai_core::CoreConfig;
use std::time::Duration;
use tokio::task::JoinHandle;

const PING_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct HealthPinger {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl HealthPinger {
    /// `interval` is clamped to at least one millisecond.
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.health_url(), config.health_interval())
    }

    /// One ping. Returns whether any HTTP response came back; callers are free to ignore it.
    pub async fn ping_once(&self) -> bool {
        match self.client.get(&self.url).timeout(PING_TIMEOUT).send().await {
            Ok(res) => {
                tracing::debug!(target: "beeai::pinger", status = res.status().as_u16(), "Health ping");
                true
            }
            Err(e) => {
                tracing::debug!(target: "beeai::pinger", error = %e, "Health ping failed");
                false
            }
        }
    }

    /// Pings immediately, then every `interval`, until the handle is stopped or dropped.
    pub fn spawn(self) -> PingerHandle {
        let handle = tokio::spawn(async move {
            tracing::debug!(
                target: "beeai::pinger",
                url = %self.url,
                interval_secs = self.interval.as_secs(),
                "Health pinger started"
            );
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.ping_once().await;
            }
        });
        PingerHandle(handle)
    }
}

/// Aborts the ping task when stopped or dropped.
pub struct PingerHandle(JoinHandle<()>);

impl PingerHandle {
    pub fn stop(self) {
        self.0.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.0.is_finished()
    }
}

impl Drop for PingerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dead_url, spawn_server};
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_app(hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/api/health",
            get(move || {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_pings_repeatedly_until_stopped() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_server(counting_app(Arc::clone(&hits))).await;
        let handle = HealthPinger::new(format!("{}/api/health", base), Duration::from_millis(20)).spawn();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(handle.is_running());
        handle.stop();
        let seen = hits.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected repeated pings, saw {}", seen);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let after = hits.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), after);
    }

    #[tokio::test]
    async fn test_errors_are_absorbed() {
        let pinger = HealthPinger::new(format!("{}/api/health", dead_url().await), Duration::from_millis(20));
        assert!(!pinger.ping_once().await);
        let handle = pinger.spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_running());
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_server(counting_app(Arc::clone(&hits))).await;
        let pinger = HealthPinger::new(format!("{}/api/health", base), Duration::ZERO);
        assert_eq!(pinger.interval, MIN_INTERVAL);
        let handle = pinger.spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_running());
        handle.stop();
        assert!(hits.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_non_success_status_still_counts_as_reached() {
        let base = spawn_server(Router::new()).await;
        let pinger = HealthPinger::new(format!("{}/api/health", base), Duration::from_secs(300));
        assert!(pinger.ping_once().await);
    }
}
