use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ReconciliationEngine;
use crate::Address;
use crate::Error;
use crate::RefreshConfig;

/// Background loop that refreshes the snapshot on a fixed period.
///
/// It is just another refresh trigger: ticks that land while a manual or
/// post-action refresh is running are coalesced by the engine. Failed reads
/// are logged and retried on the next tick only.
pub struct AutoRefresher;

impl AutoRefresher {
    /// Spawns the loop with the period from `config`.
    ///
    /// Returns `None` without spawning when `auto_refresh_interval_ms` is 0.
    pub fn spawn_from_config(
        engine: Arc<ReconciliationEngine>,
        owner: Address,
        config: &RefreshConfig,
        shutdown: watch::Receiver<()>,
    ) -> Option<JoinHandle<()>> {
        let Some(period) = config.auto_refresh_interval() else {
            debug!("auto refresh disabled by configuration");
            return None;
        };
        Some(Self::spawn(engine, owner, period, shutdown))
    }

    /// Spawns the loop. It exits when `shutdown` fires (or its sender is
    /// dropped) or when the engine itself shuts down.
    pub fn spawn(
        engine: Arc<ReconciliationEngine>,
        owner: Address,
        period: Duration,
        mut shutdown: watch::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(owner = %owner.short(), ?period, "auto refresh started");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        debug!("auto refresh received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        match engine.refresh(Some(&owner)).await {
                            Ok(snapshot) => debug!(version = snapshot.version, "auto refresh applied"),
                            Err(Error::Cancelled) => break,
                            Err(e) => warn!(error = %e, "auto refresh failed, retrying next tick"),
                        }
                    }
                }
            }

            info!("auto refresh stopped");
        })
    }
}
