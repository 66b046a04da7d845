//! Prometheus collectors for refresh and action outcomes.
//!
//! Collectors are created lazily and are NOT registered anywhere by default;
//! a host that exports metrics calls [`register_metrics`] with its own
//! [`Registry`].

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;


pub(crate) const OUTCOME_OK: &str = "ok";
pub(crate) const OUTCOME_FAILED: &str = "failed";
pub(crate) const OUTCOME_COALESCED: &str = "coalesced";
pub(crate) const OUTCOME_DISCARDED: &str = "discarded";
pub(crate) const OUTCOME_REJECTED: &str = "rejected";

lazy_static! {
    pub static ref REFRESH_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("refresh_total", "Snapshot refreshes by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref REFRESH_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("refresh_duration_seconds", "Latency of the paired ledger reads")
            .buckets(exponential_buckets(0.005, 2.0, 14).expect("valid buckets")),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref ACTION_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("action_total", "Dispatched write actions by kind and outcome"),
        &["action", "outcome"]
    )
    .expect("metric can not be created");
}

pub fn register_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(REFRESH_TOTAL.clone()))?;
    registry.register(Box::new(REFRESH_DURATION_SECONDS.clone()))?;
    registry.register(Box::new(ACTION_TOTAL.clone()))?;
    Ok(())
}
