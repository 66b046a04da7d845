use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::InFlightActions;
use crate::metrics::ACTION_TOTAL;
use crate::metrics::OUTCOME_FAILED;
use crate::metrics::OUTCOME_OK;
use crate::metrics::OUTCOME_REJECTED;
use crate::ActionTarget;
use crate::Address;
use crate::DispatchConfig;
use crate::Error;
use crate::LedgerClient;
use crate::LedgerError;
use crate::ReconciliationEngine;
use crate::Result;
use crate::TxReceipt;

const ACTION_APPROVE: &str = "approve";
const ACTION_DENY: &str = "deny";
const ACTION_REVOKE: &str = "revoke";

/// Result of a confirmed write.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReceipt {
    pub target: ActionTarget,
    pub tx: TxReceipt,
    /// Set when the post-confirmation refresh failed. The write itself still
    /// succeeded; the snapshot simply lags until the next refresh.
    pub refresh_error: Option<Error>,
}

pub struct ActionDispatcher {
    client: Arc<dyn LedgerClient>,
    engine: Arc<ReconciliationEngine>,
    in_flight: InFlightActions,
    config: DispatchConfig,
}

impl ActionDispatcher {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        engine: Arc<ReconciliationEngine>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            client,
            engine,
            in_flight: InFlightActions::default(),
            config,
        }
    }

    /// Approves (`approve = true`) or denies a pending request.
    ///
    /// Approve and deny share one guard per request id: only one of them can
    /// ever succeed on the ledger.
    ///
    /// # Errors
    /// - [`Error::Connectivity`] without a signer
    /// - [`Error::AlreadyResolved`] when the snapshot already shows a terminal
    ///   status for `request_id`
    /// - [`Error::ConcurrentActionRejected`] while another respond for the same
    ///   id is outstanding
    /// - [`Error::TransactionFailure`] when the write is rejected or reverted
    pub async fn respond(
        &self,
        owner: Option<&Address>,
        request_id: u64,
        approve: bool,
    ) -> Result<ActionReceipt> {
        let action = if approve { ACTION_APPROVE } else { ACTION_DENY };
        let Some(owner) = owner else {
            return Err(self.refuse(action, Error::Connectivity));
        };

        if let Some(request) = self.engine.request(request_id) {
            if request.status.is_terminal() {
                debug!(request_id, status = ?request.status, "respond targets a resolved request");
                return Err(self.refuse(action, Error::AlreadyResolved { id: request_id }));
            }
        }

        let target = ActionTarget::Request(request_id);
        let Some(guard) = self.in_flight.try_acquire(target.clone()) else {
            return Err(self.refuse(action, Error::ConcurrentActionRejected { target }));
        };

        info!(request_id, approve, "submitting respond transaction");
        let confirmation = self.client.respond_to_request(owner, request_id, approve).await;
        drop(guard);

        self.complete(owner, action, target, confirmation).await
    }

    /// Revokes the active grant held by `accessor`.
    ///
    /// # Errors
    /// Same taxonomy as [`respond`](Self::respond), keyed by address.
    pub async fn revoke(
        &self,
        owner: Option<&Address>,
        accessor: &Address,
    ) -> Result<ActionReceipt> {
        let Some(owner) = owner else {
            return Err(self.refuse(ACTION_REVOKE, Error::Connectivity));
        };

        let target = ActionTarget::Accessor(accessor.clone());
        let Some(guard) = self.in_flight.try_acquire(target.clone()) else {
            return Err(self.refuse(ACTION_REVOKE, Error::ConcurrentActionRejected { target }));
        };

        info!(accessor = %accessor.short(), "submitting revoke transaction");
        let confirmation = self.client.revoke_access(owner, accessor).await;
        drop(guard);

        self.complete(owner, ACTION_REVOKE, target, confirmation).await
    }

    pub fn is_in_flight(
        &self,
        target: &ActionTarget,
    ) -> bool {
        self.in_flight.contains(target)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Runs after the guard is released.
    async fn complete(
        &self,
        owner: &Address,
        action: &'static str,
        target: ActionTarget,
        confirmation: std::result::Result<TxReceipt, LedgerError>,
    ) -> Result<ActionReceipt> {
        let tx = match confirmation {
            Ok(tx) => tx,
            Err(e) => {
                warn!(%target, error = %e, "{action} transaction failed");
                ACTION_TOTAL.with_label_values(&[action, OUTCOME_FAILED]).inc();
                return Err(Error::TransactionFailure {
                    reason: Some(e.to_string()),
                });
            }
        };

        info!(%target, tx_hash = %tx.tx_hash, "{action} confirmed");
        ACTION_TOTAL.with_label_values(&[action, OUTCOME_OK]).inc();

        let refresh_error = if self.config.refresh_after_action {
            self.engine.refresh(Some(owner)).await.err()
        } else {
            None
        };
        if let Some(e) = &refresh_error {
            warn!(%target, error = %e, "post-action refresh failed");
        }

        Ok(ActionReceipt {
            target,
            tx,
            refresh_error,
        })
    }

    fn refuse(
        &self,
        action: &'static str,
        error: Error,
    ) -> Error {
        debug!(action, error = %error, "action refused before submission");
        ACTION_TOTAL.with_label_values(&[action, OUTCOME_REJECTED]).inc();
        error
    }
}
