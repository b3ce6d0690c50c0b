use std::sync::Arc;

use log::{debug, info};

use crate::error::ActionError;
use crate::gateway::dto::TransactionRecord;
use crate::gateway::handler::{validate_submission, PoolGateway};
use crate::navigation::{Navigator, Route};
use crate::poll::handler::run_poll;
use crate::sync::dto::ActivationToken;
use crate::sync::handler::PoolSynchronizer;

use super::dto::PendingAction;

/// Validates and issues the two user-triggered mutating actions, serialized
/// against the synchronizer so an action and a scheduled poll never corrupt
/// the snapshot.
pub struct ActionDispatcher {
    gateway: Arc<dyn PoolGateway>,
    sync: Arc<PoolSynchronizer>,
    navigator: Arc<dyn Navigator>,
}

impl ActionDispatcher {
    pub fn new(
        gateway: Arc<dyn PoolGateway>,
        sync: Arc<PoolSynchronizer>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            gateway,
            sync,
            navigator,
        }
    }

    /// Submit a new transaction. The echoed record becomes part of a fresh
    /// whole snapshot, any poll tick deferred during the mutation is re-run,
    /// and the presentation layer is sent to the pool view.
    pub async fn submit(
        &self,
        token: ActivationToken,
        recipient: &str,
        amount: f64,
    ) -> Result<TransactionRecord, ActionError> {
        validate_submission(recipient, amount)?;
        self.sync.begin_mutation(
            token,
            PendingAction::Submit {
                recipient: recipient.to_string(),
                amount,
            },
        )?;
        let seq = self.sync.next_sequence();

        match self.gateway.submit_transaction(recipient, amount).await {
            Ok(record) => {
                info!("transaction {} accepted", record.id);
                let next = self.sync.snapshot().with_record(record.clone());
                self.sync.apply_snapshot(token, seq, next);
                self.settle(token).await;
                self.navigator.navigate_to(Route::TransactionPool);
                Ok(record)
            }
            Err(err) => {
                let deferred = self.sync.record_mutation_error(token, &err);
                if deferred {
                    run_poll(self.gateway.as_ref(), self.sync.as_ref(), token).await;
                }
                Err(err.into())
            }
        }
    }

    /// Request block production. Navigates to the ledger view on success; a
    /// failure leaves the pool snapshot untouched and stays on this view.
    pub async fn mine(&self, token: ActivationToken) -> Result<(), ActionError> {
        self.sync.begin_mutation(token, PendingAction::Mine)?;

        match self.gateway.request_mining().await {
            Ok(()) => {
                info!("block production requested");
                self.settle(token).await;
                self.navigator.navigate_to(Route::Ledger);
                Ok(())
            }
            Err(err) => {
                let deferred = self.sync.record_mutation_error(token, &err);
                if deferred {
                    run_poll(self.gateway.as_ref(), self.sync.as_ref(), token).await;
                }
                Err(err.into())
            }
        }
    }

    async fn settle(&self, token: ActivationToken) {
        if self.sync.end_mutation(token) {
            debug!("re-running poll tick deferred during the mutation");
            run_poll(self.gateway.as_ref(), self.sync.as_ref(), token).await;
        }
    }
}
