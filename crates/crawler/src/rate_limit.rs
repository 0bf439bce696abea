//! Call budget for the remote source
//!
//! `Window` spends the whole budget, then blocks for one window and resets.
//! `Smooth` spaces calls evenly using governor's GCRA limiter.
//! Both are charged once per HTTP attempt and both can be forced into a
//! full-window cooldown when the upstream answers 429.

use citree_common::config::{RateLimitConfig, RateLimitStrategy};
use citree_common::errors::{AppError, Result};
use citree_common::metrics;
use governor::{
    clock::Clock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tracing::info;

/// Governor clock that reads tokio's time source, so limiter waits follow
/// `tokio::time` (including paused time in tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Direct limiter using governor crate
pub type SmoothLimiter = RateLimiter<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<Instant>>;

async fn cool_down(window: Duration, reason: &str) {
    info!(
        window_secs = window.as_secs(),
        reason = reason,
        "Cooling down"
    );
    metrics::record_cooldown(window.as_secs());
    tokio::time::sleep(window).await;
}

/// Counter that pauses the caller once `max_calls` calls were spent
#[derive(Debug)]
pub struct WindowBudget {
    max_calls: u32,
    window: Duration,
    calls: u32,
    charged: u64,
    cooldowns: u64,
}

impl WindowBudget {
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: 0,
            charged: 0,
            cooldowns: 0,
        }
    }

    /// Charge one call, sleeping first if the budget is spent
    pub async fn charge(&mut self) {
        if self.calls >= self.max_calls {
            self.cool_down("call budget exhausted").await;
        }
        self.calls += 1;
        self.charged += 1;
    }

    /// Sleep a whole window and start a fresh budget
    pub async fn cool_down(&mut self, reason: &str) {
        cool_down(self.window, reason).await;
        self.calls = 0;
        self.cooldowns += 1;
    }

    /// Calls spent in the current window
    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Calls charged since creation
    pub fn charged(&self) -> u64 {
        self.charged
    }

    pub fn cooldowns(&self) -> u64 {
        self.cooldowns
    }
}

/// Evenly spaced calls, one every `window / max_calls`
pub struct SmoothBudget {
    limiter: SmoothLimiter,
    clock: TokioClock,
    window: Duration,
    charged: u64,
    cooldowns: u64,
}

impl SmoothBudget {
    pub fn new(max_calls: NonZeroU32, window: Duration) -> Result<Self> {
        let quota = Quota::with_period(window / max_calls.get()).ok_or_else(|| {
            AppError::Configuration {
                message: "rate_limit.window_secs must be at least 1".to_string(),
            }
        })?;
        let clock = TokioClock;
        Ok(Self {
            limiter: RateLimiter::direct_with_clock(quota, clock),
            clock,
            window,
            charged: 0,
            cooldowns: 0,
        })
    }

    /// Wait for the next free slot, then take it
    pub async fn charge(&mut self) {
        while let Err(not_until) = self.limiter.check() {
            tokio::time::sleep(not_until.wait_time_from(self.clock.now())).await;
        }
        self.charged += 1;
    }

    pub async fn cool_down(&mut self, reason: &str) {
        cool_down(self.window, reason).await;
        self.cooldowns += 1;
    }
}

/// Call budget used by the fetcher
pub enum CallBudget {
    Window(WindowBudget),
    Smooth(SmoothBudget),
}

impl CallBudget {
    /// Create a budget from configuration
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        let max_calls = NonZeroU32::new(config.max_calls).ok_or_else(|| AppError::Configuration {
            message: "rate_limit.max_calls must be at least 1".to_string(),
        })?;
        let window = config.window();

        match config.strategy {
            RateLimitStrategy::Window => Ok(CallBudget::Window(WindowBudget::new(max_calls.get(), window))),
            RateLimitStrategy::Smooth => Ok(CallBudget::Smooth(SmoothBudget::new(max_calls, window)?)),
        }
    }

    /// Charge one call, blocking until the budget allows it
    pub async fn charge(&mut self) {
        match self {
            CallBudget::Window(budget) => budget.charge().await,
            CallBudget::Smooth(budget) => budget.charge().await,
        }
    }

    /// Block for one full window regardless of the calls spent
    pub async fn cool_down(&mut self, reason: &str) {
        match self {
            CallBudget::Window(budget) => budget.cool_down(reason).await,
            CallBudget::Smooth(budget) => budget.cool_down(reason).await,
        }
    }

    /// Calls charged since the budget was created
    pub fn charged(&self) -> u64 {
        match self {
            CallBudget::Window(budget) => budget.charged(),
            CallBudget::Smooth(budget) => budget.charged,
        }
    }

    /// Times the build paused for a full window
    pub fn cooldowns(&self) -> u64 {
        match self {
            CallBudget::Window(budget) => budget.cooldowns(),
            CallBudget::Smooth(budget) => budget.cooldowns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_hundredth_call_waits_for_cooldown() {
        let mut budget = WindowBudget::new(99, Duration::from_secs(300));
        let start = Instant::now();

        for _ in 0..99 {
            budget.charge().await;
        }
        assert_eq!(budget.calls(), 99);
        assert_eq!(budget.cooldowns(), 0);
        assert!(start.elapsed() < Duration::from_secs(1));

        budget.charge().await;
        assert!(start.elapsed() >= Duration::from_secs(300));
        assert_eq!(budget.cooldowns(), 1);
        assert_eq!(budget.calls(), 1);
        assert_eq!(budget.charged(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_resets_each_window() {
        let mut budget = WindowBudget::new(2, Duration::from_secs(10));
        for _ in 0..7 {
            budget.charge().await;
        }
        // 2 | 2 | 2 | 1
        assert_eq!(budget.cooldowns(), 3);
        assert_eq!(budget.calls(), 1);
        assert_eq!(budget.charged(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_cooldown_resets_window() {
        let mut budget = WindowBudget::new(5, Duration::from_secs(60));
        budget.charge().await;
        budget.charge().await;

        let start = Instant::now();
        budget.cool_down("upstream throttled").await;
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(budget.calls(), 0);
        assert_eq!(budget.cooldowns(), 1);
        assert_eq!(budget.charged(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_smooth_budget_spaces_calls() {
        let config = RateLimitConfig {
            strategy: RateLimitStrategy::Smooth,
            max_calls: 2,
            window_secs: 10,
        };
        let mut budget = CallBudget::from_config(&config).unwrap();

        let start = Instant::now();
        budget.charge().await;
        assert!(start.elapsed() < Duration::from_secs(1));

        budget.charge().await;
        let second = Instant::now();
        budget.charge().await;

        assert!(second.elapsed() >= Duration::from_secs(5));
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(budget.charged(), 3);
        assert_eq!(budget.cooldowns(), 0);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = RateLimitConfig {
            max_calls: 0,
            ..Default::default()
        };
        assert!(CallBudget::from_config(&config).is_err());
    }
}
