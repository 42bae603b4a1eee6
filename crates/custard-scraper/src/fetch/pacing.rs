//! Randomized delays between requests.
//!
//! All delays are expressed in multiples of a configurable time unit so tests
//! can run with a zero unit.

use std::time::Duration;

use rand::Rng;

/// Delay before attempt `attempt`: 1–3 units plus 0.5–1.5 units per prior
/// attempt.
#[must_use]
pub fn attempt_delay(unit: Duration, attempt: u32) -> Duration {
    let mut rng = rand::rng();
    let base = rng.random_range(1.0..=3.0);
    let jitter = rng.random_range(0.5..=1.5) * f64::from(attempt);
    unit.mul_f64(base + jitter)
}

/// Backoff after a failed attempt: 1–3 units.
#[must_use]
pub fn failure_backoff(unit: Duration) -> Duration {
    unit.mul_f64(rand::rng().random_range(1.0..=3.0))
}

/// Pause for `units` time units; a zero unit never touches the timer.
pub async fn pause(unit: Duration, units: f64) {
    let delay = unit.mul_f64(units);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
