//! Clock Abstraction
//!
//! All cosmetic delays (shuffling, inter-card pauses, per-character reveal
//! pacing) go through an injected [`Clock`] so orchestration logic stays
//! deterministic under test: swap in [`NoDelayClock`] and a full reading
//! runs instantly.

use std::time::Duration;

use async_trait::async_trait;

/// Source of cooperative delays
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend the caller for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that returns immediately. For headless runs and deterministic tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDelayClock;

#[async_trait]
impl Clock for NoDelayClock {
    async fn sleep(&self, _duration: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_delay_clock_is_instant() {
        let start = std::time::Instant::now();
        NoDelayClock.sleep(Duration::from_secs(60)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
