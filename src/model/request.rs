use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::expiry::is_expired;
use crate::Address;

/// Stored on-chain status. Assigned once, from `Pending` to a terminal value,
/// by the ledger. The engine never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Presentation-level status. `Expired` is derived from an `Approved` request
/// whose grant has lapsed and never exists on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl fmt::Display for DisplayStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let label = match self {
            DisplayStatus::Pending => "Pending",
            DisplayStatus::Approved => "Approved",
            DisplayStatus::Rejected => "Rejected",
            DisplayStatus::Expired => "Expired",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Ledger ordinal; the only stable key
    pub id: u64,
    pub requester: Address,
    /// Unix seconds at which the request was made
    pub timestamp: u64,
    pub duration_in_hours: u64,
    pub status: RequestStatus,
    /// Unix seconds; meaningful only when `status == Approved`
    pub expires_at: u64,
}

impl AccessRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn display_status(
        &self,
        now: u64,
    ) -> DisplayStatus {
        resolved_display_label(self, now)
    }
}

/// Newest first; equal timestamps keep ledger write order (ascending id).
pub fn request_order(
    a: &AccessRequest,
    b: &AccessRequest,
) -> Ordering {
    b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id))
}

pub fn sort_requests(requests: &mut [AccessRequest]) {
    requests.sort_by(request_order);
}

/// Splits requests into `(pending, resolved)`, each sorted with
/// [`request_order`]. Every input request lands in exactly one bucket.
pub fn partition(requests: &[AccessRequest]) -> (Vec<AccessRequest>, Vec<AccessRequest>) {
    let (mut pending, mut resolved): (Vec<_>, Vec<_>) = requests.iter().cloned().partition(AccessRequest::is_pending);
    sort_requests(&mut pending);
    sort_requests(&mut resolved);
    (pending, resolved)
}

/// Label shown for a request. Only an `Approved` request can read as
/// `Expired`; the stored status is left untouched.
pub fn resolved_display_label(
    request: &AccessRequest,
    now: u64,
) -> DisplayStatus {
    match request.status {
        RequestStatus::Pending => DisplayStatus::Pending,
        RequestStatus::Rejected => DisplayStatus::Rejected,
        RequestStatus::Approved if is_expired(request.expires_at, now) => DisplayStatus::Expired,
        RequestStatus::Approved => DisplayStatus::Approved,
    }
}
