//! Value types observed on the ledger and the pure derivations over them.
//!
//! Nothing here performs I/O or reads the clock. The engine feeds these
//! functions the latest snapshot plus an explicit `now`.

mod accessor;
mod request;
mod stats;

pub use accessor::*;
pub use request::*;
pub use stats::*;
