use crate::active_non_expired;
use crate::partition;
use crate::resolved_display_label;
use crate::stats;
use crate::AccessRequest;
use crate::AccessStats;
use crate::ActiveAccessor;
use crate::DisplayStatus;
use crate::Error;

/// Canonical local copy of ledger state.
///
/// `requests` and `accessors` always come from the same reconciliation; they
/// are never patched individually.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub requests: Vec<AccessRequest>,
    pub accessors: Vec<ActiveAccessor>,
    /// Error of the most recent failed refresh, cleared by the next success
    pub last_error: Option<Error>,
    pub is_loading: bool,
    /// Number of reconciliations applied so far; 0 means never loaded
    pub version: u64,
    /// Unix seconds of the last successful reconciliation
    pub fetched_at: Option<u64>,
    /// Refresh ticket watermark the data was fetched for
    pub(crate) ticket: u64,
}

impl Snapshot {
    pub fn is_loaded(&self) -> bool {
        self.version > 0
    }

    pub fn request(
        &self,
        id: u64,
    ) -> Option<&AccessRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Derives everything a dashboard shows at instant `now`.
    pub fn view(
        &self,
        now: u64,
    ) -> PermissionView {
        let (pending, resolved) = partition(&self.requests);
        let resolved = resolved
            .into_iter()
            .map(|request| ResolvedRequest {
                label: resolved_display_label(&request, now),
                request,
            })
            .collect();

        PermissionView {
            pending,
            resolved,
            active: active_non_expired(&self.accessors, now),
            stats: stats(&self.requests, &self.accessors, now),
            last_error: self.last_error.clone(),
            is_loading: self.is_loading,
            version: self.version,
        }
    }

    pub(crate) fn with_loading(
        &self,
        is_loading: bool,
    ) -> Self {
        Self {
            is_loading,
            ..self.clone()
        }
    }

    pub(crate) fn with_error(
        &self,
        error: Error,
    ) -> Self {
        Self {
            last_error: Some(error),
            is_loading: false,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub request: AccessRequest,
    pub label: DisplayStatus,
}

/// Read-only projection of a [`Snapshot`] at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionView {
    /// Pending requests, newest first
    pub pending: Vec<AccessRequest>,
    /// Approved/rejected requests, newest first, with their display label
    pub resolved: Vec<ResolvedRequest>,
    /// Grants that have not lapsed at `now`
    pub active: Vec<ActiveAccessor>,
    pub stats: AccessStats,
    pub last_error: Option<Error>,
    pub is_loading: bool,
    pub version: u64,
}
