//! HTTP relay to the on-chain notary program.
//!
//! The relay owns the signing key and the ledger program; this side only
//! posts the encoded [`NotaryRecord`] and reads back the write signature.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use trustchain_core::error::NotaryError;
use trustchain_core::traits::Notary;
use trustchain_core::types::NotaryRecord;

const NOTARY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpNotary {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct NotaryReceipt {
    signature: String,
}

impl HttpNotary {
    pub fn new(endpoint: &str) -> Result<Self, NotaryError> {
        let client = Client::builder()
            .timeout(NOTARY_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotaryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notary for HttpNotary {
    async fn notarize(&self, record: &NotaryRecord) -> Result<String, NotaryError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotaryError::Timeout
                } else {
                    NotaryError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotaryError::Rejected(format!("http status {status}: {body}")));
        }

        let receipt: NotaryReceipt = resp
            .json()
            .await
            .map_err(|e| NotaryError::Rejected(format!("malformed receipt: {e}")))?;
        Ok(receipt.signature)
    }
}
