//! Time source for the poll loop and the inter-chunk pacing delay.
//!
//! Everything that waits goes through [`Clock`], so unit tests can drive a manual clock
//! that advances instantly instead of sleeping. That clock only exists in test builds:
//!
//! ```compile_fail
//! use gemini_analyzer::clock::ManualClock;
//! ```

use async_trait::async_trait;
use std::time::{Duration, Instant};

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
pub(crate) use manual::ManualClock;

#[cfg(test)]
mod manual {
    use super::Clock;
    use async_trait::async_trait;
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    /// A clock that only moves when slept on. Every sleep is recorded.
    #[derive(Debug)]
    pub struct ManualClock {
        origin: Instant,
        state: Mutex<ManualState>,
    }

    #[derive(Debug, Default)]
    struct ManualState {
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                state: Mutex::new(ManualState::default()),
            }
        }

        /// Total simulated time.
        pub fn elapsed(&self) -> Duration {
            self.lock().elapsed
        }

        /// Every sleep requested so far, in order.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.lock().sleeps.clone()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
            // a panicking test thread cannot leave the state half-updated
            self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + self.lock().elapsed
        }

        async fn sleep(&self, duration: Duration) {
            let mut state = self.lock();
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_advances_only_on_sleep() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_secs(5)).await;
        clock.sleep(Duration::from_secs(1)).await;

        assert_eq!(clock.now() - start, Duration::from_secs(6));
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(1)]
        );
    }
}
