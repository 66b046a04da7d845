//! Reconciliation engine
//!
//! Owns the single in-memory [`Snapshot`] of ledger state and is its only
//! writer. Consumers read it lock-free, subscribe to changes, or derive a
//! [`PermissionView`] for a given `now`.
//!
//! Refreshes are serialized through one gate: at most one fetch is in flight,
//! and every refresh requested while it runs is coalesced into exactly one
//! follow-up fetch. Results therefore apply in completion order and an older
//! read can never overwrite a newer one.

mod auto_refresh;
mod reconciliation;
mod snapshot;

pub use auto_refresh::*;
pub use reconciliation::*;
pub use snapshot::*;
