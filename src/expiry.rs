//! Pure time arithmetic for grants and requests.
//!
//! Every function here is deterministic and takes `now` explicitly as unix
//! seconds; nothing reads the wall clock. Callers obtain `now` from
//! [`crate::utils::time::now_secs`] (or a test clock) and pass it down.

use crate::constants::EXPIRED_LABEL;
use crate::constants::JUST_NOW_LABEL;
use crate::constants::SECONDS_PER_DAY;
use crate::constants::SECONDS_PER_HOUR;
use crate::constants::SECONDS_PER_MINUTE;
use crate::constants::UNDER_A_MINUTE_LABEL;

/// `true` iff `now >= expires_at`.
///
/// `expires_at == 0` means "never granted" and is reported as not expired.
/// Distinguishing a missing grant from an expired one is the caller's job and
/// must be done from the request status.
pub fn is_expired(
    expires_at: u64,
    now: u64,
) -> bool {
    expires_at != 0 && now >= expires_at
}

/// Seconds left until `expires_at`, zero once expired or never granted.
pub fn remaining_seconds(
    expires_at: u64,
    now: u64,
) -> u64 {
    if expires_at == 0 {
        return 0;
    }
    expires_at.saturating_sub(now)
}

/// Human label for the time left on a grant.
///
/// Buckets: `"{d}d {h}h"`, `"{h}h {m}m"`, `"{m}m"`, `"<1m"`, then `"Expired"`.
pub fn remaining_time(
    expires_at: u64,
    now: u64,
) -> String {
    let left = remaining_seconds(expires_at, now);
    if left == 0 {
        return EXPIRED_LABEL.to_string();
    }

    if left >= SECONDS_PER_DAY {
        format!(
            "{}d {}h",
            left / SECONDS_PER_DAY,
            (left % SECONDS_PER_DAY) / SECONDS_PER_HOUR
        )
    } else if left >= SECONDS_PER_HOUR {
        format!(
            "{}h {}m",
            left / SECONDS_PER_HOUR,
            (left % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
        )
    } else if left >= SECONDS_PER_MINUTE {
        format!("{}m", left / SECONDS_PER_MINUTE)
    } else {
        UNDER_A_MINUTE_LABEL.to_string()
    }
}

/// Compact label for a requested grant duration: whole days as `"{d}d"`,
/// anything else as `"{h}h"`.
pub fn duration_label(hours: u64) -> String {
    if hours >= 24 && hours % 24 == 0 {
        format!("{}d", hours / 24)
    } else {
        format!("{hours}h")
    }
}

/// Inverse of [`duration_label`].
pub fn parse_duration_label(label: &str) -> Option<u64> {
    let label = label.trim();
    if let Some(days) = label.strip_suffix('d') {
        return days.parse::<u64>().ok()?.checked_mul(24);
    }
    label.strip_suffix('h')?.parse().ok()
}

/// Relative "time since" label for a request timestamp.
///
/// Timestamps in the future (clock skew between ledger and host) read as
/// `"just now"`.
pub fn age(
    timestamp: u64,
    now: u64,
) -> String {
    let elapsed = now.saturating_sub(timestamp);
    if elapsed < SECONDS_PER_MINUTE {
        JUST_NOW_LABEL.to_string()
    } else if elapsed < SECONDS_PER_HOUR {
        format!("{}m ago", elapsed / SECONDS_PER_MINUTE)
    } else if elapsed < SECONDS_PER_DAY {
        format!("{}h ago", elapsed / SECONDS_PER_HOUR)
    } else {
        format!("{}d ago", elapsed / SECONDS_PER_DAY)
    }
}
