use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::gateway::handler::PoolGateway;
use crate::sync::dto::{ActivationToken, ApplyOutcome, PoolSnapshot};
use crate::sync::handler::PoolSynchronizer;

/// One complete poll pass: claim the polling slot, fetch, apply or absorb.
/// Used by the scheduler's timer task and by the dispatcher when it re-runs
/// a tick that was deferred during a mutation.
pub(crate) async fn run_poll(
    gateway: &dyn PoolGateway,
    sync: &PoolSynchronizer,
    token: ActivationToken,
) {
    if !sync.begin_poll(token) {
        return;
    }
    let seq = sync.next_sequence();
    match gateway.fetch_pool().await {
        Ok(records) => {
            let outcome = sync.apply_snapshot(token, seq, PoolSnapshot::new(records));
            if outcome != ApplyOutcome::Applied {
                debug!("poll seq {} not applied: {:?}", seq, outcome);
            }
        }
        Err(err) => sync.record_poll_error(token, &err),
    }
}

/// Drives `fetch_pool` on a fixed interval exactly while a view is active.
///
/// The timer task awaits each fetch before taking the next tick, so at most
/// one poll request is outstanding; a tick that comes due while a fetch is
/// still in flight is skipped, never queued. `stop` aborts the task, and the
/// activation-token check in the synchronizer guarantees an already-running
/// fetch cannot apply its result once the view has been deactivated.
pub struct PollScheduler {
    gateway: Arc<dyn PoolGateway>,
    sync: Arc<PoolSynchronizer>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(
        gateway: Arc<dyn PoolGateway>,
        sync: Arc<PoolSynchronizer>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            sync,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Begins with one immediate poll, then repeats every interval. Calling
    /// `start` while already started is a no-op.
    pub fn start(&self, token: ActivationToken) {
        let mut task = self.task.lock().expect("scheduler lock poisoned");
        if task.is_some() {
            debug!("poll scheduler already running");
            return;
        }

        let gateway = Arc::clone(&self.gateway);
        let sync = Arc::clone(&self.sync);
        let period = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // first tick completes immediately
                ticker.tick().await;
                run_poll(gateway.as_ref(), sync.as_ref(), token).await;
            }
        });
        *task = Some(handle);
        debug!("poll scheduler started (every {:?})", period);
    }

    /// Cancels the timer task. Pair with `PoolSynchronizer::deactivate` to
    /// also fence off a fetch that is mid-flight on another worker.
    pub fn stop(&self) {
        if let Some(handle) = self
            .task
            .lock()
            .expect("scheduler lock poisoned")
            .take()
        {
            handle.abort();
            debug!("poll scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .expect("scheduler lock poisoned")
            .is_some()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
