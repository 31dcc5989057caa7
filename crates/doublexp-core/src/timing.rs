//! Minute offsets between window boundaries and now.

use chrono::{DateTime, Utc};

/// Minutes from `a` to `b`. Negative when `b` is before `a`.
pub fn elapsed_minutes(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / 60_000.0
}

/// Rounds half up, so 2.5 becomes 3 and -2.5 becomes -2.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Minutes left in the window that started at `window_start`, never negative.
pub fn minutes_remaining(window_start: DateTime<Utc>, now: DateTime<Utc>, window_minutes: u32) -> i64 {
    let left = f64::from(window_minutes) - elapsed_minutes(window_start, now);
    round_half_up(left).max(0)
}

/// Minutes until `next_start`. Not clamped: a skewed clock can make it negative.
pub fn minutes_until(now: DateTime<Utc>, next_start: DateTime<Utc>) -> i64 {
    round_half_up(elapsed_minutes(now, next_start))
}
