//! Delay policies between connection attempts.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Delay applied between two consecutive failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Sleep the same interval after every failed attempt.
    Constant { delay_ms: u64 },
    /// Double the delay after every failed attempt, capped at `max_ms`, with up to 10% jitter.
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// Constant backoff with the given interval.
    pub fn constant(delay: Duration) -> Self {
        Backoff::Constant {
            delay_ms: delay.as_millis() as u64,
        }
    }

    /// Exponential backoff starting at `base` and never exceeding `max` (before jitter).
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Backoff::Exponential {
            base_ms: base.as_millis() as u64,
            max_ms: max.as_millis() as u64,
        }
    }

    /// Delay to wait after the `attempt`-th failure (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Constant { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential { base_ms, max_ms } => calculate_backoff(attempt, base_ms, max_ms),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Constant { delay_ms: 1000 }
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Jitter: 0 to 10% of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_second_constant() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(7), Duration::from_secs(1));
    }

    #[test]
    fn exponential_grows_and_caps() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 110);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000 && max.as_millis() < 1100);
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let delay = Backoff::exponential(Duration::from_millis(50), Duration::from_secs(5)).delay(u32::MAX);
        assert!(delay >= Duration::from_secs(5));
    }

    #[test]
    fn deserializes_tagged_form() {
        let backoff: Backoff = toml::from_str("kind = \"exponential\"\nbase_ms = 10\nmax_ms = 80").unwrap();
        assert_eq!(backoff, Backoff::Exponential { base_ms: 10, max_ms: 80 });
    }
}
