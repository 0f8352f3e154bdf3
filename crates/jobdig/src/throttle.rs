use rand::Rng;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MIN_DELAY_SECS: u64 = 5;
pub const DEFAULT_MAX_DELAY_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
#[error("Minimum delay ({min}s) cannot be greater than maximum delay ({max}s)")]
pub struct InvalidDelayRange {
    pub min: u64,
    pub max: u64,
}

/// Something that can pause the current task.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Unconditional randomized pause taken before every detail page request,
/// keeping the provider from seeing back-to-back hits (HTTP 429).
#[derive(Debug)]
pub struct Throttle<R, S> {
    rng: R,
    sleeper: S,
    min_secs: u64,
    max_secs: u64,
}

impl<R: Rng, S: Sleeper> Throttle<R, S> {
    pub fn new(rng: R, sleeper: S) -> Self {
        Self {
            rng,
            sleeper,
            min_secs: DEFAULT_MIN_DELAY_SECS,
            max_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }

    /// Same as [`Throttle::new`] with a custom inclusive range in seconds.
    pub fn with_range(
        rng: R,
        sleeper: S,
        min_secs: u64,
        max_secs: u64,
    ) -> Result<Self, InvalidDelayRange> {
        if min_secs > max_secs {
            return Err(InvalidDelayRange {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self {
            rng,
            sleeper,
            min_secs,
            max_secs,
        })
    }

    /// Draws a fresh delay, uniform over whole seconds in `[min, max]`.
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_secs(self.rng.random_range(self.min_secs..=self.max_secs))
    }

    pub async fn wait(&mut self) -> Duration {
        let delay = self.next_delay();
        log::info!("Sleeping for {} seconds", delay.as_secs());
        self.sleeper.sleep(delay).await;
        delay
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::{Arc, Mutex};

    /// Records requested pauses instead of waiting.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) slept: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        pub(crate) fn recorded(&self) -> Vec<Duration> {
            self.slept.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.slept.lock().unwrap().push(duration);
            std::future::ready(())
        }
    }

    #[test]
    fn test_delays_stay_within_default_bounds() {
        let mut throttle = Throttle::new(StdRng::seed_from_u64(7), RecordingSleeper::default());

        let delays: Vec<u64> = (0..1_000)
            .map(|_| throttle.next_delay().as_secs())
            .collect();

        assert!(delays.iter().all(|d| (5..=15).contains(d)));
        assert!(delays.contains(&5), "Lower bound should be reachable");
        assert!(delays.contains(&15), "Upper bound should be reachable");
    }

    #[test]
    fn test_custom_range() {
        let mut throttle =
            Throttle::with_range(StdRng::seed_from_u64(1), RecordingSleeper::default(), 2, 2)
                .expect("Range should be valid");
        assert_eq!(throttle.next_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = Throttle::with_range(StdRng::seed_from_u64(1), RecordingSleeper::default(), 9, 3)
            .unwrap_err();
        assert_eq!((err.min, err.max), (9, 3));
    }

    #[tokio::test]
    async fn test_wait_sleeps_for_sampled_delay() {
        let sleeper = RecordingSleeper::default();
        let mut throttle = Throttle::new(StdRng::seed_from_u64(42), sleeper.clone());

        let first = throttle.wait().await;
        let second = throttle.wait().await;

        assert_eq!(sleeper.recorded(), vec![first, second]);
    }
}
