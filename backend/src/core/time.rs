//! Time management for the tick engine
//!
//! The world runs on a simulated monotonic clock measured in milliseconds
//! since start-up. The consumer loop advances it; producers on other threads
//! only read it to compute due times.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Shared simulated clock
///
/// # Example
/// ```
/// use tick_engine_core_rs::GameClock;
/// use std::time::Duration;
///
/// let clock = GameClock::new();
/// assert_eq!(clock.now(), Duration::ZERO);
///
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(clock.now(), Duration::from_millis(250));
/// ```
#[derive(Debug, Default)]
pub struct GameClock {
    /// Milliseconds elapsed since world start
    elapsed_ms: AtomicU64,
}

impl GameClock {
    /// Create a clock positioned at world start
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock positioned at an arbitrary instant
    ///
    /// # Example
    /// ```
    /// use tick_engine_core_rs::GameClock;
    /// use std::time::Duration;
    ///
    /// let clock = GameClock::starting_at(Duration::from_secs(3));
    /// assert_eq!(clock.now(), Duration::from_secs(3));
    /// ```
    pub fn starting_at(instant: Duration) -> Self {
        Self {
            elapsed_ms: AtomicU64::new(duration_to_ms(instant)),
        }
    }

    /// Current simulated time
    pub fn now(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::Acquire))
    }

    /// Advance the clock by `elapsed`
    ///
    /// Sub-millisecond remainders are dropped.
    pub fn advance(&self, elapsed: Duration) {
        self.elapsed_ms
            .fetch_add(duration_to_ms(elapsed), Ordering::AcqRel);
    }

    /// Serializable snapshot of the current time
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            elapsed_ms: self.elapsed_ms.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time copy of a [`GameClock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub elapsed_ms: u64,
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
