use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use trustchain_core::error::FetchError;
use trustchain_core::traits::HistorySource;
use trustchain_core::types::{SignatureRecord, TransferRecord};
use trustchain_core::Address;

const RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Solana JSON-RPC client serving as the production [`HistorySource`].
pub struct SolanaRpcClient {
    client: Client,
    endpoint: String,
}

impl SolanaRpcClient {
    pub fn new(endpoint: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(RPC_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, FetchError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let resp: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        decode_envelope(resp)
    }

    // ── Convenience wrappers ──────────────────────────────────────────────────

    pub async fn get_signatures_for_address(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, FetchError> {
        let infos: Vec<RpcSignatureInfo> = self
            .call(
                "getSignaturesForAddress",
                json!([address.as_str(), { "limit": limit }]),
            )
            .await?;
        Ok(infos.into_iter().map(SignatureRecord::from).collect())
    }

    pub async fn get_transaction(&self, signature: &str) -> Result<Option<TransferRecord>, FetchError> {
        let tx: Option<RpcTransaction> = self
            .call(
                "getTransaction",
                json!([signature, {
                    "encoding": "jsonParsed",
                    "maxSupportedTransactionVersion": 0
                }]),
            )
            .await?;
        let record = tx.and_then(RpcTransaction::into_transfer_record);
        if record.is_none() {
            debug!(signature, "rpc: transaction has no balance metadata");
        }
        Ok(record)
    }

    pub async fn get_balance(&self, address: &Address) -> Result<u64, FetchError> {
        let balance: RpcBalance = self.call("getBalance", json!([address.as_str()])).await?;
        Ok(balance.value)
    }
}

#[async_trait]
impl HistorySource for SolanaRpcClient {
    async fn recent_signatures(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, FetchError> {
        self.get_signatures_for_address(address, limit).await
    }

    async fn transfer(&self, signature: &str) -> Result<Option<TransferRecord>, FetchError> {
        self.get_transaction(signature).await
    }

    async fn balance(&self, address: &Address) -> Result<u64, FetchError> {
        self.get_balance(address).await
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    match err.status() {
        Some(StatusCode::TOO_MANY_REQUESTS) => FetchError::Http { status: 429 },
        _ => FetchError::Transport(err.to_string()),
    }
}

/// Unwrap a JSON-RPC 2.0 response: an `error` object wins over `result`.
fn decode_envelope<T: DeserializeOwned>(resp: Value) -> Result<T, FetchError> {
    if let Some(err) = resp.get("error").filter(|e| !e.is_null()) {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| err.to_string());
        return Err(FetchError::Rpc { code, message });
    }
    let result = resp.get("result").cloned().unwrap_or(Value::Null);
    serde_json::from_value(result).map_err(|e| FetchError::Decode(e.to_string()))
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureInfo {
    signature: String,
    #[serde(default)]
    block_time: Option<i64>,
}

impl From<RpcSignatureInfo> for SignatureRecord {
    fn from(info: RpcSignatureInfo) -> Self {
        SignatureRecord {
            signature: info.signature,
            block_time: info.block_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    meta: Option<RpcMeta>,
    transaction: RpcTransactionBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcMeta {
    #[serde(default)]
    pre_balances: Vec<u64>,
    #[serde(default)]
    post_balances: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct RpcTransactionBody {
    message: RpcMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcMessage {
    #[serde(default)]
    account_keys: Vec<RpcAccountKey>,
}

/// `getBalance` wraps the lamport count in a context envelope.
#[derive(Debug, Deserialize)]
struct RpcBalance {
    value: u64,
}

/// `jsonParsed` encoding yields objects; plain `json` yields bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcAccountKey {
    Parsed { pubkey: String },
    Raw(String),
}

impl RpcAccountKey {
    fn into_pubkey(self) -> String {
        match self {
            RpcAccountKey::Parsed { pubkey } => pubkey,
            RpcAccountKey::Raw(pubkey) => pubkey,
        }
    }
}

impl RpcTransaction {
    fn into_transfer_record(self) -> Option<TransferRecord> {
        let meta = self.meta?;
        Some(TransferRecord {
            account_keys: self
                .transaction
                .message
                .account_keys
                .into_iter()
                .map(RpcAccountKey::into_pubkey)
                .collect(),
            pre_balances: meta.pre_balances,
            post_balances: meta.post_balances,
            block_time: self.block_time,
        })
    }
}
