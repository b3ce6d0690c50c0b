use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::TransportError;
use crate::gateway::dto::{KnownAddressSet, TransactionInput, TransactionRecord, WalletInfo};
use crate::gateway::handler::PoolGateway;
use crate::navigation::{Navigator, Route};

pub(crate) fn record(id: &str, from: &str, outputs: &[(&str, f64)]) -> TransactionRecord {
    TransactionRecord {
        id: id.to_string(),
        input: TransactionInput {
            address: from.to_string(),
            timestamp: 1,
            signature: serde_json::Value::Null,
        },
        output: outputs
            .iter()
            .map(|(to, amount)| (to.to_string(), *amount))
            .collect(),
    }
}

/// Let spawned tasks run up to their next suspension point.
pub(crate) async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Scripted gateway. Responses are popped per call; an empty script yields a
/// benign default. Optional delays (virtual time under a paused runtime) keep
/// a call in flight so tests can interleave completions deterministically.
#[derive(Default)]
pub(crate) struct MockGateway {
    pool: Mutex<VecDeque<Result<Vec<TransactionRecord>, TransportError>>>,
    submits: Mutex<VecDeque<Result<TransactionRecord, TransportError>>>,
    mines: Mutex<VecDeque<Result<(), TransportError>>>,
    known: Mutex<VecDeque<Result<KnownAddressSet, TransportError>>>,
    pool_delay: Mutex<Option<Duration>>,
    submit_delay: Mutex<Option<Duration>>,
    pool_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    mine_calls: AtomicUsize,
    known_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_pool(&self, response: Result<Vec<TransactionRecord>, TransportError>) {
        self.pool.lock().unwrap().push_back(response);
    }

    pub fn push_submit(&self, response: Result<TransactionRecord, TransportError>) {
        self.submits.lock().unwrap().push_back(response);
    }

    pub fn push_mine(&self, response: Result<(), TransportError>) {
        self.mines.lock().unwrap().push_back(response);
    }

    pub fn push_known(&self, response: Result<KnownAddressSet, TransportError>) {
        self.known.lock().unwrap().push_back(response);
    }

    pub fn set_pool_delay(&self, delay: Duration) {
        *self.pool_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    pub fn pool_calls(&self) -> usize {
        self.pool_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn mine_calls(&self) -> usize {
        self.mine_calls.load(Ordering::SeqCst)
    }

    pub fn known_calls(&self) -> usize {
        self.known_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolGateway for MockGateway {
    async fn fetch_pool(&self) -> Result<Vec<TransactionRecord>, TransportError> {
        self.pool_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.pool_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        self.pool.lock().unwrap().pop_front().unwrap_or(Ok(vec![]))
    }

    async fn fetch_known_addresses(&self) -> Result<KnownAddressSet, TransportError> {
        self.known_calls.fetch_add(1, Ordering::SeqCst);
        self.known
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(KnownAddressSet::default()))
    }

    async fn fetch_wallet_info(&self) -> Result<WalletInfo, TransportError> {
        Ok(WalletInfo {
            address: "me".to_string(),
            balance: 0.0,
        })
    }

    async fn submit_transaction(
        &self,
        recipient: &str,
        amount: f64,
    ) -> Result<TransactionRecord, TransportError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.submit_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(record("generated", "me", &[(recipient, amount)])))
    }

    async fn request_mining(&self) -> Result<(), TransportError> {
        self.mine_calls.fetch_add(1, Ordering::SeqCst);
        self.mines.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// Captures where the dispatcher sends the user.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}
