use serde::Deserialize;
use serde::Serialize;

use crate::active_non_expired;
use crate::AccessRequest;
use crate::ActiveAccessor;
use crate::RequestStatus;

/// Summary counts for an owner's dashboard.
///
/// `approved` and `rejected` count stored status only, so an expired grant is
/// still `approved`. Expiry only affects `active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessStats {
    pub active: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

pub fn stats(
    requests: &[AccessRequest],
    accessors: &[ActiveAccessor],
    now: u64,
) -> AccessStats {
    let mut out = AccessStats {
        active: active_non_expired(accessors, now).len(),
        ..Default::default()
    };
    for request in requests {
        match request.status {
            RequestStatus::Pending => out.pending += 1,
            RequestStatus::Approved => out.approved += 1,
            RequestStatus::Rejected => out.rejected += 1,
        }
    }
    out
}
