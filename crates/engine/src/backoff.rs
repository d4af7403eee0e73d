//! Exponential backoff with jitter for node-level retries.
//!
//! Fixed schedule from spec.md §4.3 step 4: base 1s, factor 2, cap 60s,
//! jitter ±25%. `attempt` is the retry's 0-indexed ordinal (the first retry,
//! after the initial attempt, is `attempt = 0`).

use std::time::Duration;

use rand::Rng;

const BASE_MS: u64 = 1_000;
const FACTOR: u32 = 2;
const CAP_MS: u64 = 60_000;
const JITTER: f64 = 0.25;

/// Delay before the next retry, including jitter.
///
/// Grounded directly on spec.md §4.3's fixed schedule. `rng` is injected so
/// tests can assert the jitter bounds deterministically; production callers
/// use [`next_retry_delay`], which draws from `rand::rng()`.
#[must_use]
pub fn backoff_delay(attempt: u32, rng: &mut impl Rng) -> Duration {
    let exp = BASE_MS.saturating_mul(u64::from(FACTOR).saturating_pow(attempt));
    let capped = exp.min(CAP_MS);
    let jitter_span = (capped as f64 * JITTER) as i64;
    let offset = rng.random_range(-jitter_span..=jitter_span);
    let jittered = (capped as i64 + offset).max(0);
    Duration::from_millis(jittered as u64)
}

/// Delay before the next retry, drawing jitter from the thread-local RNG.
#[must_use]
pub fn next_retry_delay(attempt: u32) -> Duration {
    backoff_delay(attempt, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn first_attempt_is_near_base() {
        let mut rng = StdRng::seed_from_u64(1);
        let d = backoff_delay(0, &mut rng);
        assert!(d.as_millis() >= 750 && d.as_millis() <= 1_250);
    }

    #[test]
    fn grows_exponentially_before_cap() {
        let mut rng = StdRng::seed_from_u64(2);
        let d1 = backoff_delay(1, &mut rng);
        assert!(d1.as_millis() >= 1_500 && d1.as_millis() <= 2_500);
    }

    #[test]
    fn caps_at_sixty_seconds_plus_jitter() {
        let mut rng = StdRng::seed_from_u64(3);
        for attempt in 6..12 {
            let d = backoff_delay(attempt, &mut rng);
            assert!(d.as_millis() <= 75_000, "attempt {attempt} delay {d:?} exceeds cap + jitter");
        }
    }

    #[test]
    fn never_negative() {
        let mut rng = StdRng::seed_from_u64(4);
        for attempt in 0..10 {
            let _ = backoff_delay(attempt, &mut rng);
        }
    }
}
