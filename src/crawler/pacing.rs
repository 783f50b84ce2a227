//! Politeness delays between chapter fetches.
//!
//! The crawl is sequential, so a per-crawl delay bounds the request rate.
//! Fetching chapters concurrently would need a limiter shared by all
//! workers instead.

use crate::config::ScrapingConfig;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Decides how long to wait between chapters, and waits.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Suspends the crawl for one pacing interval.
    async fn pause(&self);
}

/// Sleeps for a uniformly random interval in `[min, max)`.
#[derive(Debug, Clone)]
pub struct RandomPacer {
    min_sec: f64,
    max_sec: f64,
}

impl RandomPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min_sec: min.as_secs_f64(),
            max_sec: max.as_secs_f64(),
        }
    }

    pub fn from_config(config: &ScrapingConfig) -> Self {
        Self {
            min_sec: config.pacing_min_sec,
            max_sec: config.pacing_max_sec,
        }
    }

    /// Draws the next delay.
    pub fn next_delay(&self) -> Duration {
        if self.max_sec <= self.min_sec {
            return Duration::from_secs_f64(self.min_sec.max(0.0));
        }
        let secs = rand::thread_rng().gen_range(self.min_sec..self.max_sec);
        Duration::from_secs_f64(secs)
    }
}

impl Default for RandomPacer {
    fn default() -> Self {
        Self::from_config(&ScrapingConfig::default())
    }
}

#[async_trait]
impl Pacer for RandomPacer {
    async fn pause(&self) {
        let delay = self.next_delay();
        tracing::trace!(delay_ms = delay.as_millis() as u64, "pacing");
        tokio::time::sleep(delay).await;
    }
}
