//! Access permission reconciliation for ledger-backed records.
//!
//! A record owner grants, denies and revokes time-bounded access. The ledger
//! is the only source of truth; this crate keeps one local, derived snapshot
//! consistent with it and dispatches the owner's write actions.
//!
//! - [`ReconciliationEngine`] reads requests and grants through a
//!   [`LedgerClient`] and publishes immutable [`Snapshot`]s.
//! - [`ActionDispatcher`] submits approve/deny/revoke with at most one
//!   in-flight write per target, then reconciles.
//! - [`expiry`] and the model functions derive labels, buckets and counts for
//!   an explicit `now`.

mod config;
mod constants;
mod dispatch;
mod engine;
mod errors;
pub mod expiry;
mod ledger;
mod metrics;
mod model;
pub mod utils;

pub use self::config::*;
pub use dispatch::*;
pub use engine::*;
pub use errors::*;
pub use expiry::*;
pub use ledger::*;
pub use metrics::register_metrics;
pub use model::*;

//-----------------------------------------------------------
// Test utils
