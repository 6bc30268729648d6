//! Conversions between absolute expire times and remaining lifetimes.
//!
//! An expire time of `0` means the entry never expires.

use std::time::{SystemTime, UNIX_EPOCH};

/// Expire time of an entry that never expires.
pub const NEVER_EXPIRES: i64 = 0;

/// Returns the current wall-clock time in epoch milliseconds.
pub fn current_time_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Returns the lifetime left at `now_ms`, clamped at zero.
///
/// `None` means the entry never expires.
pub fn remaining_time(expire_time: i64, now_ms: i64) -> Option<i64> {
    if expire_time == NEVER_EXPIRES {
        return None;
    }
    Some(expire_time.saturating_sub(now_ms).max(0))
}

/// Returns the expire time for an entry with `remaining` milliseconds left.
///
/// `None` and lifetimes that overflow the clock map to [`NEVER_EXPIRES`].
/// A non-positive lifetime expires at `now_ms`. Results at or before the
/// epoch are clamped to `1`, since `0` would read as never expiring.
pub fn expire_time_from_remaining(remaining: Option<i64>, now_ms: i64) -> i64 {
    match remaining {
        None => NEVER_EXPIRES,
        Some(remaining) => match now_ms.checked_add(remaining.max(0)) {
            Some(expire_time) => expire_time.max(1),
            None => NEVER_EXPIRES,
        },
    }
}

/// Returns `true` if an entry with `expire_time` has expired at `now_ms`.
pub fn is_expired(expire_time: i64, now_ms: i64) -> bool {
    expire_time != NEVER_EXPIRES && expire_time <= now_ms
}
