use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::expiry::is_expired;
use crate::expiry::remaining_time;
use crate::AccessorColumns;
use crate::Address;
use crate::Error;
use crate::Result;

/// A grant currently reported as effective by the ledger.
///
/// Rebuilt from scratch on every reconciliation; the engine keeps no deletion
/// markers. A revoked or lapsed grant is simply absent from the next read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAccessor {
    pub address: Address,
    /// Unix seconds
    pub expires_at: u64,
}

impl ActiveAccessor {
    pub fn remaining_time(
        &self,
        now: u64,
    ) -> String {
        remaining_time(self.expires_at, now)
    }
}

/// Zips the ledger's parallel `(addresses, expiries)` columns.
///
/// # Errors
/// [`Error::ReadFailure`] when the columns differ in length; the read cannot
/// be trusted at all in that case.
pub fn accessors_from_columns(columns: AccessorColumns) -> Result<Vec<ActiveAccessor>> {
    let AccessorColumns { addresses, expiries } = columns;
    if addresses.len() != expiries.len() {
        return Err(Error::read_failure(format!(
            "accessor columns differ in length: {} addresses, {} expiries",
            addresses.len(),
            expiries.len()
        )));
    }

    Ok(addresses
        .into_iter()
        .zip(expiries)
        .map(|(address, expires_at)| ActiveAccessor { address, expires_at })
        .collect())
}

/// Keeps one entry per address, preserving first-seen order. When the ledger
/// reports an address twice the later expiry wins.
pub fn dedupe_accessors(accessors: Vec<ActiveAccessor>) -> Vec<ActiveAccessor> {
    let mut positions: HashMap<Address, usize> = HashMap::with_capacity(accessors.len());
    let mut unique: Vec<ActiveAccessor> = Vec::with_capacity(accessors.len());

    for accessor in accessors {
        match positions.get(&accessor.address) {
            Some(&pos) => {
                warn!(
                    address = %accessor.address,
                    "ledger reported duplicate accessor entry, keeping the later expiry"
                );
                let kept = &mut unique[pos];
                kept.expires_at = kept.expires_at.max(accessor.expires_at);
            }
            None => {
                positions.insert(accessor.address.clone(), unique.len());
                unique.push(accessor);
            }
        }
    }

    unique
}

pub fn active_non_expired(
    accessors: &[ActiveAccessor],
    now: u64,
) -> Vec<ActiveAccessor> {
    accessors
        .iter()
        .filter(|a| !is_expired(a.expires_at, now))
        .cloned()
        .collect()
}
