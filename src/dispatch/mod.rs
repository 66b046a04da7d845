//! Write action dispatch
//!
//! [`ActionDispatcher`] submits approve/deny/revoke transactions through the
//! [`crate::LedgerClient`], allows at most one in-flight write per logical
//! target, waits for confirmation and then asks the engine to reconcile.
//! Writes are never retried here: a ledger transaction is not idempotent, so
//! a failed attempt must be re-initiated by the caller.

mod action_guard;
mod dispatcher;

pub(crate) use action_guard::*;
pub use dispatcher::*;
