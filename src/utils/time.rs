use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Current wall clock as unix seconds.
///
/// A clock set before 1970 reads as `0` rather than panicking.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
