use crate::gateway::dto::TransactionRecord;

/// Monotonically increasing tag assigned when a request is dispatched, used
/// to order asynchronous completions.
pub type SequenceNumber = u64;

/// Identity of one live view activation. Completions tagged with an older
/// token belong to a torn-down view and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationToken(pub(crate) u64);

/// Complete point-in-time copy of the pending pool. Always replaced whole;
/// the remote service is the sole source of truth for membership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolSnapshot {
    records: Vec<TransactionRecord>,
}

impl PoolSnapshot {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A fresh whole snapshot with `record` included, replacing any earlier
    /// record with the same id.
    pub fn with_record(&self, record: TransactionRecord) -> Self {
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|existing| existing.id != record.id)
            .cloned()
            .collect();
        records.push(record);
        Self { records }
    }
}

/// Where the synchronizer is in its poll/mutate cycle. Errors are transient
/// and clear on the next successful operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    Idle,
    Polling,
    Mutating,
    Error(String),
}

/// What the synchronizer decided to do with a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Superseded by a newer already-applied result. Logged, never surfaced.
    Stale,
    /// The view that issued the request is no longer active.
    InactiveView,
}
