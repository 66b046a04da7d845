// -
// Time units (seconds)

pub(crate) const SECONDS_PER_MINUTE: u64 = 60;
pub(crate) const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
pub(crate) const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

// -
// Display labels

pub(crate) const EXPIRED_LABEL: &str = "Expired";
pub(crate) const UNDER_A_MINUTE_LABEL: &str = "<1m";
pub(crate) const JUST_NOW_LABEL: &str = "just now";

// -
// Configuration

/// Environment variable prefix, e.g. `LEDGER_ACCESS__REFRESH__READ_TIMEOUT_MS`
pub(crate) const CONFIG_ENV_PREFIX: &str = "LEDGER_ACCESS";
pub(crate) const CONFIG_ENV_SEPARATOR: &str = "__";
