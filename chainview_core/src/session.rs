use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;

use crate::dispatch::handler::ActionDispatcher;
use crate::error::{ActionError, TransportError};
use crate::gateway::dto::{KnownAddressSet, TransactionRecord, WalletInfo};
use crate::gateway::handler::PoolGateway;
use crate::navigation::Navigator;
use crate::poll::handler::PollScheduler;
use crate::sync::dto::{ActivationToken, PoolSnapshot, SyncState};
use crate::sync::handler::PoolSynchronizer;

/// Wires the gateway, synchronizer, scheduler and dispatcher together for
/// one view and owns the activation lifecycle. The presentation layer holds
/// one of these, activates it when the pool view appears and deactivates it
/// when the user navigates away.
pub struct ViewSession {
    gateway: Arc<dyn PoolGateway>,
    sync: Arc<PoolSynchronizer>,
    scheduler: PollScheduler,
    dispatcher: ActionDispatcher,
    token: Mutex<Option<ActivationToken>>,
    known_addresses: Mutex<Option<KnownAddressSet>>,
}

impl ViewSession {
    pub fn new(
        gateway: Arc<dyn PoolGateway>,
        navigator: Arc<dyn Navigator>,
        poll_interval: Duration,
    ) -> Self {
        let sync = Arc::new(PoolSynchronizer::new());
        let scheduler = PollScheduler::new(Arc::clone(&gateway), Arc::clone(&sync), poll_interval);
        let dispatcher = ActionDispatcher::new(Arc::clone(&gateway), Arc::clone(&sync), navigator);
        Self {
            gateway,
            sync,
            scheduler,
            dispatcher,
            token: Mutex::new(None),
            known_addresses: Mutex::new(None),
        }
    }

    /// Activate the view: fresh token, empty snapshot, polling begins
    /// immediately. Re-activating an already-active session starts over.
    pub fn activate(&self) -> ActivationToken {
        self.scheduler.stop();
        let token = self.sync.activate();
        *self.token.lock().expect("session lock poisoned") = Some(token);
        *self.known_addresses.lock().expect("session lock poisoned") = None;
        self.scheduler.start(token);
        token
    }

    /// Tear the view down. The token is invalidated before the timer task is
    /// aborted, so nothing still in flight can mutate the snapshot after
    /// this returns.
    pub fn deactivate(&self) {
        self.sync.deactivate();
        self.scheduler.stop();
        *self.token.lock().expect("session lock poisoned") = None;
        *self.known_addresses.lock().expect("session lock poisoned") = None;
        debug!("view session deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.token.lock().expect("session lock poisoned").is_some()
    }

    pub async fn submit(
        &self,
        recipient: &str,
        amount: f64,
    ) -> Result<TransactionRecord, ActionError> {
        let token = self.current_token().ok_or(ActionError::ViewInactive)?;
        self.dispatcher.submit(token, recipient, amount).await
    }

    pub async fn mine(&self) -> Result<(), ActionError> {
        let token = self.current_token().ok_or(ActionError::ViewInactive)?;
        self.dispatcher.mine(token).await
    }

    /// Known addresses are fetched once per activation and cached for
    /// display; the core never mutates the set.
    pub async fn known_addresses(&self) -> Result<KnownAddressSet, TransportError> {
        {
            let cached = self.known_addresses.lock().expect("session lock poisoned");
            if let Some(set) = cached.as_ref() {
                return Ok(set.clone());
            }
        }
        let set = self.gateway.fetch_known_addresses().await?;
        *self.known_addresses.lock().expect("session lock poisoned") = Some(set.clone());
        Ok(set)
    }

    pub async fn wallet_info(&self) -> Result<WalletInfo, TransportError> {
        self.gateway.fetch_wallet_info().await
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.sync.snapshot()
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    fn current_token(&self) -> Option<ActivationToken> {
        *self.token.lock().expect("session lock poisoned")
    }
}
