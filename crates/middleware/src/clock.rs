//! Publish-latency clock backed by the CPU timestamp counter.

use once_cell::sync::Lazy;
use quanta::Clock;

/// Process-wide TSC clock
pub static CLOCK: Lazy<Clock> = Lazy::new(Clock::new);

/// Raw TSC reading, stamped on records and used as a latency start mark
#[inline]
pub fn now_tsc() -> u64 {
    CLOCK.raw()
}

/// Seconds elapsed since a `now_tsc()` start mark
#[inline]
pub fn elapsed_secs(start: u64) -> f64 {
    CLOCK.delta(start, now_tsc()).as_secs_f64()
}
