use std::sync::Arc;
use std::time::Duration;

use ledger_access::AutoRefresher;
use ledger_access::Error;
use ledger_access::ReconciliationEngine;
use ledger_access::RefreshConfig;
use tokio::sync::watch;
use tracing_test::traced_test;

use crate::common::*;

fn engine_over(ledger: &Arc<ContractLedger>) -> Arc<ReconciliationEngine> {
    Arc::new(ReconciliationEngine::new(ledger.clone(), RefreshConfig::default()))
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
#[traced_test]
async fn overlapping_refreshes_end_on_the_latest_read() {
    let clock = Clock::at(T0);
    let ledger = Arc::new(ContractLedger::new(clock.clone()));
    let engine = engine_over(&ledger);
    ledger.submit_request(REQUESTER, 24);

    ledger.stall_reads();
    let slow = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.refresh(Some(&owner())).await })
    };
    ledger.wait_reads_started(1).await;

    // Ledger moves on while the first read is still outstanding
    ledger.submit_request(OTHER, 48);
    let fast = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.refresh(Some(&owner())).await })
    };
    settle().await;

    ledger.unstall_reads();
    let slow = slow.await.unwrap().unwrap();
    let fast = fast.await.unwrap().unwrap();

    assert_eq!(slow.requests.len(), 1);
    assert_eq!(fast.requests.len(), 2);
    let current = engine.snapshot();
    assert_eq!(current, fast);
    assert_eq!(current.version, 2);
    assert_eq!(ledger.reads_completed(), 2);
}

#[tokio::test]
#[traced_test]
async fn burst_of_refreshes_costs_one_follow_up_read() {
    let ledger = Arc::new(ContractLedger::new(Clock::at(T0)));
    let engine = engine_over(&ledger);

    ledger.stall_reads();
    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.refresh(Some(&owner())).await })
    };
    ledger.wait_reads_started(1).await;

    ledger.submit_request(REQUESTER, 24);
    let burst: Vec<_> = (0..5)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.refresh(Some(&owner())).await })
        })
        .collect();
    settle().await;

    ledger.unstall_reads();
    first.await.unwrap().unwrap();
    for handle in burst {
        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.requests.len(), 1);
        assert_eq!(snapshot.version, 2);
    }

    assert_eq!(ledger.reads_completed(), 2);
}

#[tokio::test]
#[traced_test]
async fn shutdown_discards_outstanding_refresh() {
    let ledger = Arc::new(ContractLedger::new(Clock::at(T0)));
    let engine = engine_over(&ledger);
    ledger.submit_request(REQUESTER, 24);

    ledger.stall_reads();
    let pending = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.refresh(Some(&owner())).await })
    };
    ledger.wait_reads_started(1).await;

    engine.shutdown();
    ledger.unstall_reads();

    assert_eq!(pending.await.unwrap().unwrap_err(), Error::Cancelled);
    assert!(!engine.snapshot().is_loaded());
    assert!(!engine.snapshot().is_loading);
    assert_eq!(engine.refresh(Some(&owner())).await.unwrap_err(), Error::Cancelled);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn auto_refresh_picks_up_new_requests_until_shut_down() {
    let ledger = Arc::new(ContractLedger::new(Clock::at(T0)));
    let engine = engine_over(&ledger);
    let period = RefreshConfig::default().auto_refresh_interval().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let handle = AutoRefresher::spawn(engine.clone(), owner(), period, shutdown_rx);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(engine.snapshot().is_loaded());
    assert!(engine.view(T0).pending.is_empty());

    ledger.submit_request(REQUESTER, 24);
    tokio::time::sleep(period).await;
    assert_eq!(engine.view(T0).pending.len(), 1);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let reads = ledger.reads_completed();
    ledger.submit_request(OTHER, 24);
    tokio::time::sleep(period * 3).await;
    assert_eq!(ledger.reads_completed(), reads);
    assert_eq!(engine.view(T0).pending.len(), 1);
}
