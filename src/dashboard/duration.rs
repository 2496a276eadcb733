//! Short relative-time formatting

use chrono::TimeDelta;

/// Magnitude of `delta` rounded to whole minutes: `0m`, `4m`, `17m`.
pub fn humanize(delta: TimeDelta) -> String {
    format!("{}m", round_minutes(delta).unsigned_abs())
}

/// Signed whole minutes, rounding half away from zero.
pub fn round_minutes(delta: TimeDelta) -> i64 {
    let millis = delta.num_milliseconds();
    let minutes = (millis.abs() + 30_000) / 60_000;
    if millis < 0 {
        -minutes
    } else {
        minutes
    }
}
