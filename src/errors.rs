//! Access Reconciliation Error Hierarchy
//!
//! Every failure the engine or dispatcher can report is a typed value of
//! [`Error`]. Nothing crosses the refresh/action boundary as a panic: a failed
//! remote call becomes one of these variants and the caller decides what to do.

use std::fmt;

use crate::Address;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Logical target of a write action, used as the single-flight guard key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionTarget {
    /// `respond` is keyed by request id alone, never by the approve/deny choice
    Request(u64),
    /// `revoke` is keyed by accessor address
    Accessor(Address),
}

impl fmt::Display for ActionTarget {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ActionTarget::Request(id) => write!(f, "request #{id}"),
            ActionTarget::Accessor(address) => write!(f, "accessor {address}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No connected signer/owner identity. All reads and writes are skipped.
    #[error("No connected signer: ledger reads and writes are disabled")]
    Connectivity,

    /// A refresh read failed. The previous snapshot is retained.
    #[error("Ledger read failed: {reason}")]
    ReadFailure { reason: String },

    /// A write was submitted but rejected, reverted or never confirmed.
    #[error("Transaction failed: {}", reason.as_deref().unwrap_or("unknown reason"))]
    TransactionFailure { reason: Option<String> },

    /// An equivalent write for the same target is still in flight.
    #[error("Action already in progress for {target}")]
    ConcurrentActionRejected { target: ActionTarget },

    /// The request already reached a terminal status on the ledger.
    #[error("Request #{id} is already resolved")]
    AlreadyResolved { id: u64 },

    /// The engine was shut down while the refresh was outstanding.
    #[error("Refresh cancelled")]
    Cancelled,
}

impl Error {
    /// Read failures are always safe to retry with another refresh.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ReadFailure { .. })
    }

    pub(crate) fn read_failure(reason: impl Into<String>) -> Self {
        Error::ReadFailure {
            reason: reason.into(),
        }
    }
}

/// Failures while loading or validating [`crate::Settings`]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
