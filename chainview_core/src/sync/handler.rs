use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::{debug, warn};

use crate::dispatch::dto::PendingAction;
use crate::error::{ActionError, TransportError};

use super::dto::{ActivationToken, ApplyOutcome, PoolSnapshot, SequenceNumber, SyncState};

struct Inner {
    token: u64,
    snapshot: PoolSnapshot,
    state: SyncState,
    last_applied_seq: SequenceNumber,
    pending: Option<PendingAction>,
    poll_deferred: bool,
}

/// Owns the single authoritative snapshot/state pair for the active view.
///
/// Every outbound request is tagged with a sequence number at dispatch time
/// and with the activation token of the view that issued it; completions are
/// accepted only if the token still matches and the sequence number is newer
/// than the last applied one. That one rule resolves every ordering race
/// between overlapping polls and mutations.
pub struct PoolSynchronizer {
    inner: Mutex<Inner>,
    next_seq: AtomicU64,
}

impl Default for PoolSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolSynchronizer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                token: 0,
                snapshot: PoolSnapshot::default(),
                state: SyncState::Idle,
                last_applied_seq: 0,
                pending: None,
                poll_deferred: false,
            }),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Begin a fresh view activation: new token, empty snapshot, clean state.
    /// Any completion still in flight for the previous activation will be
    /// rejected by the token check.
    pub fn activate(&self) -> ActivationToken {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        inner.token += 1;
        inner.snapshot = PoolSnapshot::default();
        inner.state = SyncState::Idle;
        inner.last_applied_seq = 0;
        inner.pending = None;
        inner.poll_deferred = false;
        debug!("view activated (token {})", inner.token);
        ActivationToken(inner.token)
    }

    /// Tear the view down. After this returns, no outstanding completion can
    /// mutate the snapshot.
    pub fn deactivate(&self) {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        inner.token += 1;
        inner.snapshot = PoolSnapshot::default();
        inner.state = SyncState::Idle;
        inner.pending = None;
        inner.poll_deferred = false;
        debug!("view deactivated");
    }

    pub fn current_token(&self) -> ActivationToken {
        let inner = self.inner.lock().expect("synchronizer lock poisoned");
        ActivationToken(inner.token)
    }

    /// Sequence numbers are assigned at dispatch time, one per outbound
    /// request, and never reused.
    pub fn next_sequence(&self) -> SequenceNumber {
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Try to move into `Polling`. Returns false when the tick must not run:
    /// the view is gone, a poll is already outstanding, or a mutation is in
    /// flight (in which case the tick is deferred, not dropped).
    pub fn begin_poll(&self, token: ActivationToken) -> bool {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        if inner.token != token.0 {
            return false;
        }
        match inner.state {
            SyncState::Mutating => {
                debug!("poll tick deferred until the mutation settles");
                inner.poll_deferred = true;
                false
            }
            SyncState::Polling => {
                debug!("poll tick skipped, previous poll still in flight");
                false
            }
            SyncState::Idle | SyncState::Error(_) => {
                inner.state = SyncState::Polling;
                true
            }
        }
    }

    /// Apply a completed snapshot if it is still relevant. A result from a
    /// slower, older request never overwrites one already applied from a
    /// newer request.
    pub fn apply_snapshot(
        &self,
        token: ActivationToken,
        seq: SequenceNumber,
        snapshot: PoolSnapshot,
    ) -> ApplyOutcome {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        if inner.token != token.0 {
            debug!("discarding snapshot from inactive view (seq {})", seq);
            return ApplyOutcome::InactiveView;
        }
        if seq < inner.last_applied_seq {
            debug!(
                "discarding stale snapshot (seq {} < applied {})",
                seq, inner.last_applied_seq
            );
            return ApplyOutcome::Stale;
        }
        inner.snapshot = snapshot;
        inner.last_applied_seq = seq;
        // a mutation in flight keeps its state; its own completion path ends it
        if inner.state != SyncState::Mutating {
            inner.state = SyncState::Idle;
        }
        debug!(
            "applied snapshot seq {} ({} pending transactions)",
            seq,
            inner.snapshot.len()
        );
        ApplyOutcome::Applied
    }

    /// Absorb a poll failure into the sync state. Subsequent ticks proceed
    /// normally; the next success clears the error.
    pub fn record_poll_error(&self, token: ActivationToken, err: &TransportError) {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        if inner.token != token.0 {
            return;
        }
        warn!("poll failed: {}", err);
        if inner.state != SyncState::Mutating {
            inner.state = SyncState::Error(err.to_string());
        }
    }

    /// Claim the single mutation slot. At most one user action is in flight
    /// at a time; a second claim returns `Busy` without any request issued.
    pub fn begin_mutation(
        &self,
        token: ActivationToken,
        action: PendingAction,
    ) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        if inner.token != token.0 {
            return Err(ActionError::ViewInactive);
        }
        if inner.pending.is_some() {
            return Err(ActionError::Busy);
        }
        debug!("mutation started: {:?}", action);
        inner.pending = Some(action);
        inner.state = SyncState::Mutating;
        Ok(())
    }

    /// Settle a successful mutation. Returns true when a poll tick was
    /// deferred during the mutation and should be re-run now.
    pub fn end_mutation(&self, token: ActivationToken) -> bool {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        if inner.token != token.0 {
            return false;
        }
        inner.pending = None;
        if inner.state == SyncState::Mutating {
            inner.state = SyncState::Idle;
        }
        std::mem::take(&mut inner.poll_deferred)
    }

    /// Settle a failed mutation: cached state stays untouched, the error is
    /// recorded as transient. Returns the deferred-poll flag like
    /// [`end_mutation`](Self::end_mutation).
    pub fn record_mutation_error(&self, token: ActivationToken, err: &TransportError) -> bool {
        let mut inner = self.inner.lock().expect("synchronizer lock poisoned");
        if inner.token != token.0 {
            return false;
        }
        warn!("mutation failed: {}", err);
        inner.pending = None;
        inner.state = SyncState::Error(err.to_string());
        std::mem::take(&mut inner.poll_deferred)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.inner
            .lock()
            .expect("synchronizer lock poisoned")
            .snapshot
            .clone()
    }

    pub fn state(&self) -> SyncState {
        self.inner
            .lock()
            .expect("synchronizer lock poisoned")
            .state
            .clone()
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.inner
            .lock()
            .expect("synchronizer lock poisoned")
            .pending
            .clone()
    }

    pub fn last_applied_sequence(&self) -> SequenceNumber {
        self.inner
            .lock()
            .expect("synchronizer lock poisoned")
            .last_applied_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn snapshot(ids: &[&str]) -> PoolSnapshot {
        PoolSnapshot::new(
            ids.iter()
                .map(|id| record(id, "me", &[("abc", 1.0)]))
                .collect(),
        )
    }

    #[test]
    fn applied_sequence_numbers_never_regress() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();

        assert_eq!(
            sync.apply_snapshot(token, 4, snapshot(&["t4"])),
            ApplyOutcome::Applied
        );
        assert_eq!(
            sync.apply_snapshot(token, 3, snapshot(&["t3"])),
            ApplyOutcome::Stale
        );
        assert_eq!(sync.snapshot().records()[0].id, "t4");
        assert_eq!(sync.last_applied_sequence(), 4);
    }

    #[test]
    fn results_from_a_deactivated_view_are_dropped() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();
        sync.deactivate();

        assert_eq!(
            sync.apply_snapshot(token, 1, snapshot(&["t1"])),
            ApplyOutcome::InactiveView
        );
        assert!(sync.snapshot().is_empty());
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn reactivation_resets_the_snapshot() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();
        sync.apply_snapshot(token, 1, snapshot(&["t1"]));

        let token = sync.activate();
        assert!(sync.snapshot().is_empty());
        assert_eq!(sync.last_applied_sequence(), 0);
        // sequence numbers keep climbing across activations
        assert!(sync.next_sequence() > 1);
        assert_eq!(sync.current_token(), token);
    }

    #[test]
    fn poll_during_mutation_is_deferred_not_dropped() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();
        sync.begin_mutation(token, PendingAction::Mine).unwrap();

        assert!(!sync.begin_poll(token));
        assert_eq!(sync.state(), SyncState::Mutating);
        assert!(sync.end_mutation(token));
        // the flag is consumed
        assert!(!sync.end_mutation(token));
    }

    #[test]
    fn only_one_poll_is_outstanding() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();

        assert!(sync.begin_poll(token));
        assert!(!sync.begin_poll(token));
        let seq = sync.next_sequence();
        sync.apply_snapshot(token, seq, snapshot(&[]));
        assert!(sync.begin_poll(token));
    }

    #[test]
    fn second_mutation_claim_is_busy() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();

        sync.begin_mutation(
            token,
            PendingAction::Submit {
                recipient: "abc".to_string(),
                amount: 5.0,
            },
        )
        .unwrap();
        assert_eq!(
            sync.begin_mutation(token, PendingAction::Mine),
            Err(ActionError::Busy)
        );
        assert!(sync.pending_action().is_some());

        sync.end_mutation(token);
        assert!(sync.pending_action().is_none());
        assert!(sync.begin_mutation(token, PendingAction::Mine).is_ok());
    }

    #[test]
    fn poll_errors_are_transient() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();

        assert!(sync.begin_poll(token));
        sync.record_poll_error(token, &TransportError::Network("refused".to_string()));
        assert!(matches!(sync.state(), SyncState::Error(_)));

        // next tick runs and its success clears the error
        assert!(sync.begin_poll(token));
        let seq = sync.next_sequence();
        sync.apply_snapshot(token, seq, snapshot(&["t1"]));
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn poll_completing_during_a_mutation_keeps_the_mutating_state() {
        let sync = PoolSynchronizer::new();
        let token = sync.activate();

        assert!(sync.begin_poll(token));
        let poll_seq = sync.next_sequence();
        sync.begin_mutation(token, PendingAction::Mine).unwrap();

        // the earlier poll completes while the mutation is still in flight
        sync.apply_snapshot(token, poll_seq, snapshot(&["t1"]));
        assert_eq!(sync.state(), SyncState::Mutating);
        assert_eq!(sync.snapshot().len(), 1);
    }
}
