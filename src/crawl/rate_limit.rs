//! Request spacing shared by every crawl in the process.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;

type DirectLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Hands out one permit per `period`, without bursts.
///
/// A waiter dropped before its permit is granted does not consume one. A
/// zero period disables limiting.
pub struct RateLimiter {
    period: Duration,
    limiter: Option<DirectLimiter>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("period", &self.period)
            .field("limited", &self.limiter.is_some())
            .finish()
    }
}

impl RateLimiter {
    pub fn new(period: Duration) -> Self {
        let limiter = Quota::with_period(period)
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .map(DirectLimiter::direct);

        Self { period, limiter }
    }

    /// Limiter allowing `per_second` permits per second.
    pub fn per_second(per_second: u32) -> Self {
        Self::new(Duration::from_secs(1) / per_second.max(1))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next permit.
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
