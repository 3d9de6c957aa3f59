// Delay Policy Port - simulated work/processing time between queue operations

use rand::Rng;
use std::time::Duration;

/// Source of per-item simulated delays.
///
/// Delays are cosmetic: they make interleaving visible in the logs and never
/// take part in queue correctness. Tests inject `NoDelay`.
pub trait DelayPolicy: Send + Sync {
    /// Delay to apply after the next item
    fn next_delay(&self) -> Duration;
}

/// No simulated delay (deterministic tests)
pub struct NoDelay;

impl DelayPolicy for NoDelay {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }
}

/// Uniform random delay in `[0, max)`
pub struct RandomDelay {
    max: Duration,
}

impl RandomDelay {
    pub fn new(max: Duration) -> Self {
        Self { max }
    }
}

impl DelayPolicy for RandomDelay {
    fn next_delay(&self) -> Duration {
        let max_ms = self.max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

pub mod mocks {
    use super::*;

    /// Constant delay
    pub struct FixedDelay(pub Duration);

    impl DelayPolicy for FixedDelay {
        fn next_delay(&self) -> Duration {
            self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delay_stays_below_max() {
        let policy = RandomDelay::new(Duration::from_millis(20));
        for _ in 0..200 {
            assert!(policy.next_delay() < Duration::from_millis(20));
        }
    }

    #[test]
    fn test_zero_max_means_no_delay() {
        let policy = RandomDelay::new(Duration::ZERO);
        assert_eq!(policy.next_delay(), Duration::ZERO);
        assert_eq!(NoDelay.next_delay(), Duration::ZERO);
    }
}
