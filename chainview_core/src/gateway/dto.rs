use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The signed input half of a transaction, produced by the remote wallet.
/// The signature shape is backend-defined and opaque to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub address: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub signature: serde_json::Value,
}

/// A pending transaction as returned by the ledger service. Immutable once
/// received; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub input: TransactionInput,
    pub output: BTreeMap<String, f64>,
}

impl TransactionRecord {
    /// Display lines for the presentation layer: the sender first, then one
    /// line per recipient.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(1 + self.output.len());
        lines.push(format!("From: {}", self.input.address));
        for (recipient, amount) in &self.output {
            lines.push(format!("To: {} | Sent: {}", recipient, amount));
        }
        lines
    }

    /// Single-line rendering of [`summary_lines`](Self::summary_lines).
    pub fn summary(&self) -> String {
        self.summary_lines().join(" | ")
    }
}

/// Addresses the wallet has seen before, fetched once per view activation
/// and used only for display and recipient selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownAddressSet(BTreeSet<String>);

impl KnownAddressSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.0.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-joined listing, the way the conduct-transaction view shows it.
    pub fn display(&self) -> String {
        self.0
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<String> for KnownAddressSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Address/balance pair shown by the home view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: String,
    pub balance: f64,
}

/// POST body for `/wallet/transact`.
#[derive(Debug, Serialize)]
pub(crate) struct TransactRequest<'a> {
    pub recipient: &'a str,
    pub amount: f64,
}
