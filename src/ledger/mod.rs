//! Ledger abstraction layer
//!
//! The ledger (an external permissioned contract) is the only source of truth
//! for access requests and grants. This module defines the contract the engine
//! consumes; the signer, transport and contract storage all live behind
//! [`LedgerClient`] and are provided by the host.
//!
//! Implementations are expected to bound their own calls (retry, backoff,
//! timeouts). The engine treats every reported failure as terminal for that
//! attempt.

mod address;

pub use address::*;


use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::AccessRequest;

/// Raw `getActiveAccessors` result: two parallel columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorColumns {
    pub addresses: Vec<Address>,
    pub expiries: Vec<u64>,
}

/// Confirmation of a mined write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    /// Transport or node unreachable
    Connection,
    /// The user or signer refused to sign
    Rejected,
    /// Mined but the contract call reverted
    Reverted,
    /// Confirmation never arrived within the client's own bounds
    Timeout,
    /// The node answered with data that could not be decoded
    Malformed,
}

/// Uniform failure reported by a [`LedgerClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerError {
    pub kind: LedgerErrorKind,
    /// Optional human readable reason, e.g. a revert string
    pub reason: Option<String>,
}

impl LedgerError {
    pub fn new(
        kind: LedgerErrorKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            reason: Some(reason.into()),
        }
    }

    pub fn without_reason(kind: LedgerErrorKind) -> Self {
        Self { kind, reason: None }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{:?}: {}", self.kind, reason),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// All access requests addressed to `owner`, in ledger order.
    ///
    /// The position of each entry defines its id. The engine overwrites
    /// `AccessRequest::id` with that ordinal, whatever the client reports.
    async fn get_requests(
        &self,
        owner: &Address,
    ) -> Result<Vec<AccessRequest>, LedgerError>;

    /// Currently effective grants for `owner`, as parallel columns.
    async fn get_active_accessors(
        &self,
        owner: &Address,
    ) -> Result<AccessorColumns, LedgerError>;

    /// Approves or denies a pending request.
    ///
    /// Resolves once the transaction is confirmed, not when it is broadcast.
    async fn respond_to_request(
        &self,
        owner: &Address,
        request_id: u64,
        approve: bool,
    ) -> Result<TxReceipt, LedgerError>;

    /// Revokes an active grant. Resolves on confirmation.
    async fn revoke_access(
        &self,
        owner: &Address,
        accessor: &Address,
    ) -> Result<TxReceipt, LedgerError>;
}
