//! Shared stubs and wallet fixtures for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use trustchain_core::error::{FetchError, NotaryError, ReputationError};
use trustchain_core::traits::{HistorySource, Notary, ReputationSource};
use trustchain_core::types::{NotaryRecord, SignatureRecord, TransferRecord};
use trustchain_core::Address;

pub const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
pub const COUNTERPARTY: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

/// Arbitrary epoch all fixtures are offset from.
pub const BASE_TIME: i64 = 1_700_000_000;

pub fn wallet() -> Address {
    Address::parse(WALLET).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Comparable transfers at irregular intervals. Verified under both regimes.
pub fn organic_wallet() -> ScriptedHistory {
    ScriptedHistory::from_transfers(
        &[1_000, 1_100, 900, 1_000, 1_050, 950, 1_000, 1_000],
        &[0, 15, 35, 47, 77, 102, 120, 2_000_120],
    )
}

/// Even amounts on a fixed 60s cadence.
pub fn bot_wallet() -> ScriptedHistory {
    ScriptedHistory::from_transfers(
        &[500; 8],
        &[0, 60, 120, 180, 240, 300, 360, 420],
    )
}

/// One dominant transfer and dust.
pub fn whale_wallet() -> ScriptedHistory {
    ScriptedHistory::from_transfers(&[1_000_000, 1, 1, 1], &[0, 400, 9_000, 70_000])
}

/// Too little history to judge.
pub fn fresh_wallet() -> ScriptedHistory {
    ScriptedHistory::from_transfers(&[1_000, 2_000], &[0, 500])
}

// ---------------------------------------------------------------------------
// History source
// ---------------------------------------------------------------------------

/// In-memory [`HistorySource`] with call counters and injectable failures.
#[derive(Default)]
pub struct ScriptedHistory {
    signatures: Vec<SignatureRecord>,
    transfers: HashMap<String, TransferRecord>,
    /// Rate-limit the first N listing calls.
    listing_rate_limits: usize,
    listing_error: Option<FetchError>,
    failing_transfers: Vec<String>,
    /// Lamports reported by `balance`.
    lamports: u64,
    pub listing_calls: AtomicUsize,
    pub transfer_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
}

impl ScriptedHistory {
    /// One transfer per amount, where `WALLET` moves `amounts[i]` at
    /// `BASE_TIME + offsets[i]`.
    pub fn from_transfers(amounts: &[u64], offsets: &[i64]) -> Self {
        assert_eq!(amounts.len(), offsets.len());
        let mut history = Self::default();
        for (i, (&amount, &offset)) in amounts.iter().zip(offsets).enumerate() {
            let signature = format!("sig{i}");
            let time = BASE_TIME + offset;
            history.signatures.push(SignatureRecord {
                signature: signature.clone(),
                block_time: Some(time),
            });
            history.transfers.insert(
                signature,
                TransferRecord {
                    account_keys: vec![WALLET.to_string(), COUNTERPARTY.to_string()],
                    pre_balances: vec![amount + 10_000, 0],
                    post_balances: vec![10_000, amount],
                    block_time: Some(time),
                },
            );
        }
        history
    }

    pub fn rate_limited_listing(mut self, times: usize) -> Self {
        self.listing_rate_limits = times;
        self
    }

    pub fn failing_listing(mut self, error: FetchError) -> Self {
        self.listing_error = Some(error);
        self
    }

    pub fn failing_transfer(mut self, signature: &str) -> Self {
        self.failing_transfers.push(signature.to_string());
        self
    }

    pub fn with_balance(mut self, lamports: u64) -> Self {
        self.lamports = lamports;
        self
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn transfer_calls(&self) -> usize {
        self.transfer_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for ScriptedHistory {
    async fn recent_signatures(
        &self,
        _address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, FetchError> {
        let call = self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.listing_rate_limits {
            return Err(FetchError::Http { status: 429 });
        }
        if let Some(err) = &self.listing_error {
            return Err(err.clone());
        }
        Ok(self.signatures.iter().take(limit).cloned().collect())
    }

    async fn transfer(&self, signature: &str) -> Result<Option<TransferRecord>, FetchError> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_transfers.iter().any(|s| s == signature) {
            return Err(FetchError::Transport("connection reset".into()));
        }
        Ok(self.transfers.get(signature).cloned())
    }

    async fn balance(&self, _address: &Address) -> Result<u64, FetchError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lamports)
    }
}

// ---------------------------------------------------------------------------
// Reputation source
// ---------------------------------------------------------------------------

pub struct FixedReputation {
    result: Result<f64, ReputationError>,
    pub calls: AtomicUsize,
}

impl FixedReputation {
    pub fn score(score: f64) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(score),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: ReputationError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReputationSource for FixedReputation {
    async fn fetch_score(&self, _address: &Address) -> Result<f64, ReputationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// Notary
// ---------------------------------------------------------------------------

/// Records every notarization; optionally rejects them all.
#[derive(Default)]
pub struct RecordingNotary {
    reject: bool,
    pub records: Mutex<Vec<NotaryRecord>>,
}

impl RecordingNotary {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            reject: true,
            ..Self::default()
        })
    }

    pub fn records(&self) -> Vec<NotaryRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notary for RecordingNotary {
    async fn notarize(&self, record: &NotaryRecord) -> Result<String, NotaryError> {
        self.records.lock().unwrap().push(record.clone());
        if self.reject {
            return Err(NotaryError::Rejected("program account not initialized".into()));
        }
        Ok(format!("notarized-{}-{}", record.address, record.status_code))
    }
}
