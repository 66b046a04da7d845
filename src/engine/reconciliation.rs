use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::future::try_join;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::PermissionView;
use super::Snapshot;
use crate::accessors_from_columns;
use crate::dedupe_accessors;
use crate::metrics::OUTCOME_COALESCED;
use crate::metrics::OUTCOME_DISCARDED;
use crate::metrics::OUTCOME_FAILED;
use crate::metrics::OUTCOME_OK;
use crate::metrics::REFRESH_DURATION_SECONDS;
use crate::metrics::REFRESH_TOTAL;
use crate::utils::time::now_secs;
use crate::AccessRequest;
use crate::ActiveAccessor;
use crate::Address;
use crate::Error;
use crate::LedgerClient;
use crate::RefreshConfig;
use crate::Result;

/// Bookkeeping guarded by the refresh gate.
#[derive(Default)]
struct RefreshRound {
    /// Highest ticket whose request is satisfied by the last completed fetch
    covered: u64,
    last_outcome: Option<Result<Arc<Snapshot>>>,
}

/// Keeps the local snapshot consistent with the ledger.
///
/// # Refresh coalescing
/// Every call to [`refresh`](Self::refresh) takes a ticket. A fetch records the
/// highest ticket issued when it starts; once it completes, every caller whose
/// ticket is at or below that watermark receives its outcome instead of
/// fetching again. Callers that arrived while it was running are served by a
/// single follow-up fetch.
pub struct ReconciliationEngine {
    client: Arc<dyn LedgerClient>,
    config: RefreshConfig,

    current: ArcSwap<Snapshot>,
    publisher: watch::Sender<Arc<Snapshot>>,

    gate: Mutex<RefreshRound>,
    tickets: AtomicU64,

    shutdown: CancellationToken,
}

impl ReconciliationEngine {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        config: RefreshConfig,
    ) -> Self {
        let initial = Arc::new(Snapshot::default());
        let (publisher, _) = watch::channel(initial.clone());
        Self {
            client,
            config,
            current: ArcSwap::new(initial),
            publisher,
            gate: Mutex::new(RefreshRound::default()),
            tickets: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Current snapshot. Never blocks, even while a refresh is running.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Receives every published snapshot: applied reconciliations as well as
    /// loading and error transitions.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.publisher.subscribe()
    }

    pub fn view(
        &self,
        now: u64,
    ) -> PermissionView {
        self.current.load().view(now)
    }

    pub fn request(
        &self,
        id: u64,
    ) -> Option<AccessRequest> {
        self.current.load().request(id).cloned()
    }

    /// Discards the outcome of every outstanding refresh and refuses new ones.
    pub fn shutdown(&self) {
        info!("reconciliation engine shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Re-reads requests and grants for `owner` and swaps the snapshot.
    ///
    /// # Errors
    /// - [`Error::Connectivity`] when `owner` is `None`; nothing is read
    /// - [`Error::ReadFailure`] when either read fails; the previous data is
    ///   kept and `last_error` is set
    /// - [`Error::Cancelled`] when the engine shut down before the result
    ///   could be applied; the snapshot data is left untouched and the
    ///   loading flag is cleared
    ///
    /// Dropping the returned future mid-fetch also clears the loading flag.
    pub async fn refresh(
        &self,
        owner: Option<&Address>,
    ) -> Result<Arc<Snapshot>> {
        let Some(owner) = owner else {
            warn!("refresh requested without a connected signer");
            // A fetch may still be running for another caller; leave its
            // loading flag alone.
            self.update(|current| {
                Some(Snapshot {
                    last_error: Some(Error::Connectivity),
                    ..current.clone()
                })
            });
            return Err(Error::Connectivity);
        };
        if self.shutdown.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;

        let mut round = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                REFRESH_TOTAL.with_label_values(&[OUTCOME_DISCARDED]).inc();
                return Err(Error::Cancelled);
            }
            round = self.gate.lock() => round,
        };

        if round.covered >= ticket {
            if let Some(outcome) = round.last_outcome.clone() {
                trace!(ticket, covered = round.covered, "refresh coalesced into completed fetch");
                REFRESH_TOTAL.with_label_values(&[OUTCOME_COALESCED]).inc();
                return outcome;
            }
        }

        // Every ticket issued up to here is satisfied by the fetch below.
        let watermark = self.tickets.load(Ordering::SeqCst);
        debug!(ticket, watermark, owner = %owner.short(), "refreshing snapshot");
        self.update(|current| Some(current.with_loading(true)));
        let loading = LoadingGuard::new(self);

        let started = Instant::now();
        let fetched = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!(ticket, "refresh cancelled, discarding result");
                REFRESH_TOTAL.with_label_values(&[OUTCOME_DISCARDED]).inc();
                return Err(Error::Cancelled);
            }
            fetched = self.fetch(owner) => fetched,
        };

        loading.disarm();
        let outcome = match fetched {
            Ok((requests, accessors)) => {
                REFRESH_DURATION_SECONDS
                    .with_label_values(&[OUTCOME_OK])
                    .observe(started.elapsed().as_secs_f64());
                Ok(self.apply(watermark, requests, accessors))
            }
            Err(e) => {
                warn!(error = %e, "refresh failed, keeping previous snapshot");
                REFRESH_DURATION_SECONDS
                    .with_label_values(&[OUTCOME_FAILED])
                    .observe(started.elapsed().as_secs_f64());
                REFRESH_TOTAL.with_label_values(&[OUTCOME_FAILED]).inc();
                self.update(|current| Some(current.with_error(e.clone())));
                Err(e)
            }
        };

        round.covered = watermark;
        round.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Issues both reads concurrently; either failing fails the pair.
    async fn fetch(
        &self,
        owner: &Address,
    ) -> Result<(Vec<AccessRequest>, Vec<ActiveAccessor>)> {
        let read_timeout = self.config.read_timeout();

        let requests = async {
            match timeout(read_timeout, self.client.get_requests(owner)).await {
                Ok(Ok(requests)) => Ok(assign_ordinals(requests)),
                Ok(Err(e)) => Err(Error::read_failure(format!("get_requests: {e}"))),
                Err(_) => Err(Error::read_failure(format!(
                    "get_requests timed out after {read_timeout:?}"
                ))),
            }
        };

        let accessors = async {
            let columns = match timeout(read_timeout, self.client.get_active_accessors(owner)).await {
                Ok(Ok(columns)) => columns,
                Ok(Err(e)) => return Err(Error::read_failure(format!("get_active_accessors: {e}"))),
                Err(_) => {
                    return Err(Error::read_failure(format!(
                        "get_active_accessors timed out after {read_timeout:?}"
                    )))
                }
            };
            accessors_from_columns(columns).map(dedupe_accessors)
        };

        try_join(requests, accessors).await
    }

    fn apply(
        &self,
        watermark: u64,
        requests: Vec<AccessRequest>,
        accessors: Vec<ActiveAccessor>,
    ) -> Arc<Snapshot> {
        let applied = self.update(|previous| {
            if previous.ticket > watermark {
                debug!(
                    watermark,
                    applied = previous.ticket,
                    "discarding stale refresh result"
                );
                return None;
            }
            Some(Snapshot {
                requests,
                accessors,
                last_error: None,
                is_loading: false,
                version: previous.version + 1,
                fetched_at: Some(now_secs()),
                ticket: watermark,
            })
        });

        match applied {
            Some(next) => {
                debug!(
                    version = next.version,
                    requests = next.requests.len(),
                    accessors = next.accessors.len(),
                    "snapshot applied"
                );
                REFRESH_TOTAL.with_label_values(&[OUTCOME_OK]).inc();
                next
            }
            None => {
                REFRESH_TOTAL.with_label_values(&[OUTCOME_DISCARDED]).inc();
                self.current.load_full()
            }
        }
    }

    /// Single write path for the snapshot.
    ///
    /// `derive` runs while the publisher's lock is held, so concurrent writers
    /// are serialized and each one derives from the snapshot the previous one
    /// stored. Returning `None` leaves the snapshot untouched.
    fn update(
        &self,
        derive: impl FnOnce(&Snapshot) -> Option<Snapshot>,
    ) -> Option<Arc<Snapshot>> {
        let mut stored = None;
        self.publisher.send_if_modified(|current| {
            let Some(next) = derive(current) else {
                return false;
            };
            let next = Arc::new(next);
            self.current.store(next.clone());
            *current = next.clone();
            stored = Some(next);
            true
        });
        stored
    }
}

/// Clears the loading flag if a fetch ends without reaching the apply step:
/// shutdown, or the caller dropping the refresh future.
struct LoadingGuard<'a> {
    engine: &'a ReconciliationEngine,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(engine: &'a ReconciliationEngine) -> Self {
        Self { engine, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        trace!("refresh abandoned mid-fetch, clearing loading flag");
        self.engine
            .update(|current| current.is_loading.then(|| current.with_loading(false)));
    }
}

/// The ledger's ordering defines request ids.
fn assign_ordinals(mut requests: Vec<AccessRequest>) -> Vec<AccessRequest> {
    for (position, request) in requests.iter_mut().enumerate() {
        let ordinal = position as u64;
        if request.id != ordinal {
            warn!(
                reported = request.id,
                ordinal, "ledger request id disagrees with its position, using position"
            );
            request.id = ordinal;
        }
    }
    requests
}
