use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::AccessRequest;
use crate::AccessorColumns;
use crate::Address;
use crate::LedgerClient;
use crate::LedgerError;
use crate::LedgerErrorKind;
use crate::RequestStatus;
use crate::TxReceipt;

/// Gate that callers wait on until it is opened.
struct Gate {
    open: watch::Sender<bool>,
}

impl Gate {
    fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self { open }
    }

    fn hold(&self) {
        self.open.send_replace(false);
    }

    fn release(&self) {
        self.open.send_replace(true);
    }

    async fn pass(&self) {
        let mut rx = self.open.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

/// Counter whose changes can be awaited.
struct Counter {
    value: watch::Sender<usize>,
}

impl Counter {
    fn new() -> Self {
        let (value, _) = watch::channel(0);
        Self { value }
    }

    fn bump(&self) {
        self.value.send_modify(|v| *v += 1);
    }

    fn get(&self) -> usize {
        *self.value.borrow()
    }

    async fn reach(
        &self,
        n: usize,
    ) {
        let mut rx = self.value.subscribe();
        let _ = rx.wait_for(|v| *v >= n).await;
    }
}

#[derive(Default)]
struct LedgerState {
    requests: Vec<AccessRequest>,
    accessors: AccessorColumns,
    now: u64,
    /// Failures keyed by 1-based `get_requests` call number
    read_failures: HashMap<usize, LedgerError>,
    next_write_error: Option<LedgerError>,
}

pub struct GatedLedger {
    state: Mutex<LedgerState>,
    read_gate: Gate,
    write_gate: Gate,
    reads_started: Counter,
    writes_started: Counter,
    read_calls: AtomicUsize,
    reads_in_flight: AtomicUsize,
    max_reads_in_flight: AtomicUsize,
    write_calls: AtomicUsize,
}

impl Default for GatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl GatedLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            read_gate: Gate::new(),
            write_gate: Gate::new(),
            reads_started: Counter::new(),
            writes_started: Counter::new(),
            read_calls: AtomicUsize::new(0),
            reads_in_flight: AtomicUsize::new(0),
            max_reads_in_flight: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_requests(
        self,
        requests: Vec<AccessRequest>,
    ) -> Self {
        self.set_requests(requests);
        self
    }

    pub fn set_requests(
        &self,
        requests: Vec<AccessRequest>,
    ) {
        self.state.lock().requests = requests;
    }

    pub fn set_accessors(
        &self,
        addresses: Vec<&str>,
        expiries: Vec<u64>,
    ) {
        self.state.lock().accessors = AccessorColumns {
            addresses: addresses.into_iter().map(Address::new).collect(),
            expiries,
        };
    }

    pub fn set_now(
        &self,
        now: u64,
    ) {
        self.state.lock().now = now;
    }

    /// Fails the next `get_requests` call that has not started yet.
    pub fn fail_next_read(
        &self,
        error: LedgerError,
    ) {
        let next = self.read_calls.load(Ordering::SeqCst) + 1;
        self.fail_read(next, error);
    }

    /// Fails the `call`-th (1-based) `get_requests` call.
    pub fn fail_read(
        &self,
        call: usize,
        error: LedgerError,
    ) {
        self.state.lock().read_failures.insert(call, error);
    }

    pub fn fail_next_write(
        &self,
        error: LedgerError,
    ) {
        self.state.lock().next_write_error = Some(error);
    }

    /// Reads started after this call capture ledger data, then wait for
    /// [`Self::release_reads`].
    pub fn hold_reads(&self) {
        self.read_gate.hold();
    }

    pub fn release_reads(&self) {
        self.read_gate.release();
    }

    /// Writes started after this call wait for [`Self::release_writes`]
    /// before taking effect.
    pub fn hold_writes(&self) {
        self.write_gate.hold();
    }

    pub fn release_writes(&self) {
        self.write_gate.release();
    }

    /// Number of `get_requests` calls started so far
    pub fn reads_started(&self) -> usize {
        self.reads_started.get()
    }

    pub async fn wait_reads_started(
        &self,
        n: usize,
    ) {
        self.reads_started.reach(n).await
    }

    pub async fn wait_writes_started(
        &self,
        n: usize,
    ) {
        self.writes_started.reach(n).await
    }

    pub fn max_reads_in_flight(&self) -> usize {
        self.max_reads_in_flight.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn request_status(
        &self,
        id: u64,
    ) -> Option<RequestStatus> {
        self.state.lock().requests.iter().find(|r| r.id == id).map(|r| r.status)
    }

    fn take_read_error(
        &self,
        call: usize,
    ) -> Option<LedgerError> {
        self.state.lock().read_failures.remove(&call)
    }

    async fn begin_write(&self) -> Result<(), LedgerError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.writes_started.bump();
        self.write_gate.pass().await;
        match self.state.lock().next_write_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn receipt(&self) -> TxReceipt {
        TxReceipt {
            tx_hash: format!("0x{:064x}", self.write_calls()),
        }
    }
}

#[async_trait]
impl LedgerClient for GatedLedger {
    async fn get_requests(
        &self,
        _owner: &Address,
    ) -> Result<Vec<AccessRequest>, LedgerError> {
        let requests = self.state.lock().requests.clone();
        let call = self.read_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_reads_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        self.reads_started.bump();

        self.read_gate.pass().await;
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.take_read_error(call) {
            Some(e) => Err(e),
            None => Ok(requests),
        }
    }

    async fn get_active_accessors(
        &self,
        _owner: &Address,
    ) -> Result<AccessorColumns, LedgerError> {
        Ok(self.state.lock().accessors.clone())
    }

    async fn respond_to_request(
        &self,
        _owner: &Address,
        request_id: u64,
        approve: bool,
    ) -> Result<TxReceipt, LedgerError> {
        self.begin_write().await?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = state.now;
        let Some(request) = state.requests.iter_mut().find(|r| r.id == request_id) else {
            return Err(LedgerError::new(LedgerErrorKind::Reverted, "unknown request"));
        };
        if request.status.is_terminal() {
            return Err(LedgerError::new(LedgerErrorKind::Reverted, "request already resolved"));
        }

        if approve {
            request.status = RequestStatus::Approved;
            request.expires_at = now + request.duration_in_hours * 3_600;
            let (address, expires_at) = (request.requester.clone(), request.expires_at);
            state.accessors.addresses.push(address);
            state.accessors.expiries.push(expires_at);
        } else {
            request.status = RequestStatus::Rejected;
        }
        drop(guard);

        Ok(self.receipt())
    }

    async fn revoke_access(
        &self,
        _owner: &Address,
        accessor: &Address,
    ) -> Result<TxReceipt, LedgerError> {
        self.begin_write().await?;

        let mut state = self.state.lock();
        let Some(pos) = state.accessors.addresses.iter().position(|a| a == accessor) else {
            return Err(LedgerError::new(LedgerErrorKind::Reverted, "no active grant"));
        };
        state.accessors.addresses.remove(pos);
        state.accessors.expiries.remove(pos);
        drop(state);

        Ok(self.receipt())
    }
}
