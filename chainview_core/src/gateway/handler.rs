use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::error::{ActionError, TransportError};

use super::dto::{KnownAddressSet, TransactRequest, TransactionRecord, WalletInfo};

/// The remote operations the view core needs, behind a seam so the
/// synchronizer and dispatcher can be driven by a scripted gateway in tests.
#[async_trait]
pub trait PoolGateway: Send + Sync {
    async fn fetch_pool(&self) -> Result<Vec<TransactionRecord>, TransportError>;
    async fn fetch_known_addresses(&self) -> Result<KnownAddressSet, TransportError>;
    async fn fetch_wallet_info(&self) -> Result<WalletInfo, TransportError>;
    async fn submit_transaction(
        &self,
        recipient: &str,
        amount: f64,
    ) -> Result<TransactionRecord, TransportError>;
    async fn request_mining(&self) -> Result<(), TransportError>;
}

/// Local submit validation. Runs before any network call; a rejection here
/// never produces traffic.
pub fn validate_submission(recipient: &str, amount: f64) -> Result<(), ActionError> {
    if recipient.trim().is_empty() {
        return Err(ActionError::Validation(
            "recipient must not be empty".to_string(),
        ));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ActionError::Validation(
            "amount must be a finite positive number".to_string(),
        ));
    }
    Ok(())
}

/// reqwest-backed gateway against the ledger service's HTTP API. Every call
/// is a single attempt with a per-request timeout; nothing retries.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(err.to_string())
        }
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_string());
        Err(TransportError::Server {
            status: status.as_u16(),
            detail,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, TransportError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let resp = Self::check_status(resp).await?;
        resp.json().await.map_err(|e| self.classify(e))
    }
}

#[async_trait]
impl PoolGateway for HttpGateway {
    async fn fetch_pool(&self) -> Result<Vec<TransactionRecord>, TransportError> {
        self.get_json("/transactions").await
    }

    async fn fetch_known_addresses(&self) -> Result<KnownAddressSet, TransportError> {
        let addresses: Vec<String> = self.get_json("/known-addresses").await?;
        Ok(addresses.into_iter().collect())
    }

    async fn fetch_wallet_info(&self) -> Result<WalletInfo, TransportError> {
        self.get_json("/wallet/info").await
    }

    async fn submit_transaction(
        &self,
        recipient: &str,
        amount: f64,
    ) -> Result<TransactionRecord, TransportError> {
        let url = self.url("/wallet/transact");
        debug!("POST {} recipient={} amount={}", url, recipient, amount);
        let resp = self
            .client
            .post(&url)
            .json(&TransactRequest { recipient, amount })
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let resp = Self::check_status(resp).await?;
        resp.json().await.map_err(|e| self.classify(e))
    }

    async fn request_mining(&self) -> Result<(), TransportError> {
        let url = self.url("/blockchain/mine");
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        Self::check_status(resp).await?;
        Ok(())
    }
}
