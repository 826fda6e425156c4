//! Batched history collection for one address.
//!
//! Lists recent signatures, then resolves each to a balance delta in small
//! concurrent batches with a pause between batches. Every call goes through
//! [`fetch_with_retry`]. A failed signature listing fails the collection; a
//! failed per-transaction fetch only loses that record's amount.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use trustchain_core::constants::{FETCH_BATCH_DELAY, FETCH_BATCH_SIZE, SIGNATURE_LIMIT};
use trustchain_core::error::FetchError;
use trustchain_core::traits::HistorySource;
use trustchain_core::types::{SignatureRecord, TransactionSample};
use trustchain_core::{Address, ObservationSet};

use crate::retry::{fetch_with_retry, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Most recent signatures to examine.
    pub signature_limit: usize,
    /// Transactions fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            signature_limit: SIGNATURE_LIMIT,
            batch_size: FETCH_BATCH_SIZE,
            batch_delay: FETCH_BATCH_DELAY,
        }
    }
}

pub struct HistoryCollector {
    source: Arc<dyn HistorySource>,
    retry: RetryPolicy,
    config: CollectorConfig,
}

impl HistoryCollector {
    pub fn new(source: Arc<dyn HistorySource>, retry: RetryPolicy, config: CollectorConfig) -> Self {
        Self {
            source,
            retry,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Collect the observation set for `address`.
    ///
    /// Per-transaction tasks are detached: if the caller drops this future
    /// mid-batch, fetches already in flight run to completion.
    pub async fn collect(&self, address: &Address) -> Result<ObservationSet, FetchError> {
        let source = &*self.source;
        let limit = self.config.signature_limit;
        let signatures = fetch_with_retry(&self.retry, move || {
            source.recent_signatures(address, limit)
        })
        .await?;

        info!(%address, count = signatures.len(), "history: analyzing signatures");

        let batch_size = self.config.batch_size.max(1);
        let mut samples = Vec::with_capacity(signatures.len());
        for (batch_index, batch) in signatures.chunks(batch_size).enumerate() {
            if batch_index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let handles: Vec<_> = batch
                .iter()
                .map(|record| {
                    let source = Arc::clone(&self.source);
                    let address = address.clone();
                    let record = record.clone();
                    let retry = self.retry;
                    tokio::spawn(async move { sample(&*source, retry, &address, &record).await })
                })
                .collect();

            for (handle, record) in handles.into_iter().zip(batch) {
                match handle.await {
                    Ok(s) => samples.push(s),
                    Err(e) => {
                        warn!(signature = %record.signature, error = %e, "history: fetch task failed");
                        samples.push(TransactionSample {
                            amount: 0,
                            timestamp: record.block_time,
                        });
                    }
                }
            }
        }

        let observations = ObservationSet::from_samples(samples);
        debug!(
            %address,
            samples = observations.sample_count(),
            usable = observations.amounts().len(),
            timestamps = observations.timestamps().len(),
            "history: collected"
        );
        Ok(observations)
    }

    /// Current balance of `address` in lamports.
    pub async fn balance(&self, address: &Address) -> Result<u64, FetchError> {
        let source = &*self.source;
        let lamports = fetch_with_retry(&self.retry, move || source.balance(address)).await?;
        debug!(%address, lamports, "history: balance");
        Ok(lamports)
    }
}

/// Resolve one signature to a sample. Never fails: an unusable record still
/// counts toward the sample total and keeps its listing timestamp.
async fn sample(
    source: &dyn HistorySource,
    retry: RetryPolicy,
    address: &Address,
    record: &SignatureRecord,
) -> TransactionSample {
    let signature = record.signature.as_str();
    let fetched = fetch_with_retry(&retry, move || source.transfer(signature)).await;
    let (amount, tx_time) = match fetched {
        Ok(Some(transfer)) => {
            let amount = transfer.balance_delta(address).unwrap_or_else(|| {
                debug!(signature, "history: address not among account keys");
                0
            });
            (amount, transfer.block_time)
        }
        Ok(None) => (0, None),
        Err(e) => {
            warn!(signature, error = %e, "history: transaction fetch failed, skipping amount");
            (0, None)
        }
    };
    TransactionSample {
        amount,
        timestamp: record.block_time.or(tx_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trustchain_core::types::TransferRecord;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[derive(Default)]
    struct StubHistory {
        signatures: Vec<SignatureRecord>,
        transfers: HashMap<String, Result<Option<TransferRecord>, FetchError>>,
        listing_failures: AtomicUsize,
        listing_calls: AtomicUsize,
        transfer_calls: AtomicUsize,
        transfer_latency: Duration,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl HistorySource for StubHistory {
        async fn recent_signatures(
            &self,
            _address: &Address,
            limit: usize,
        ) -> Result<Vec<SignatureRecord>, FetchError> {
            let call = self.listing_calls.fetch_add(1, Ordering::SeqCst);
            if call < self.listing_failures.load(Ordering::SeqCst) {
                return Err(FetchError::Http { status: 429 });
            }
            Ok(self.signatures.iter().take(limit).cloned().collect())
        }

        async fn transfer(&self, signature: &str) -> Result<Option<TransferRecord>, FetchError> {
            self.transfer_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.transfer_latency.is_zero() {
                tokio::time::sleep(self.transfer_latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.transfers.get(signature).cloned().unwrap_or(Ok(None))
        }

        async fn balance(&self, _address: &Address) -> Result<u64, FetchError> {
            Ok(0)
        }
    }

    fn transfer(pre: u64, post: u64) -> TransferRecord {
        TransferRecord {
            account_keys: vec![WALLET.to_string()],
            pre_balances: vec![pre],
            post_balances: vec![post],
            block_time: None,
        }
    }

    fn sig(name: &str, time: i64) -> SignatureRecord {
        SignatureRecord {
            signature: name.to_string(),
            block_time: Some(time),
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test(start_paused = true)]
    async fn collects_amounts_and_timestamps_in_order() {
        let mut stub = StubHistory::default();
        stub.signatures = vec![sig("a", 100), sig("b", 200), sig("c", 300), sig("d", 400)];
        stub.transfers.insert("a".into(), Ok(Some(transfer(1_000, 600))));
        stub.transfers.insert("b".into(), Ok(Some(transfer(600, 900))));
        stub.transfers.insert("c".into(), Ok(Some(transfer(900, 900))));
        stub.transfers.insert("d".into(), Ok(Some(transfer(900, 100))));
        let stub = Arc::new(stub);

        let collector = HistoryCollector::new(stub.clone(), fast_retry(), CollectorConfig::default());
        let obs = collector.collect(&Address::parse(WALLET).unwrap()).await.unwrap();

        assert_eq!(obs.sample_count(), 4);
        assert_eq!(obs.amounts(), &[400, 300, 800]);
        assert_eq!(obs.timestamps(), &[100, 200, 300, 400]);
        assert_eq!(stub.transfer_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_transaction_still_counts() {
        let mut stub = StubHistory::default();
        stub.signatures = vec![sig("a", 100), sig("b", 200), sig("c", 300)];
        stub.transfers.insert("a".into(), Ok(Some(transfer(10, 20))));
        stub.transfers.insert("b".into(), Err(FetchError::Transport("reset".into())));
        stub.transfers.insert("c".into(), Ok(None));

        let collector =
            HistoryCollector::new(Arc::new(stub), fast_retry(), CollectorConfig::default());
        let obs = collector.collect(&Address::parse(WALLET).unwrap()).await.unwrap();

        assert_eq!(obs.sample_count(), 3);
        assert_eq!(obs.amounts(), &[10]);
        assert_eq!(obs.timestamps(), &[100, 200, 300]);
    }

    #[tokio::test(start_paused = true)]
    async fn listing_retries_through_rate_limits() {
        let stub = StubHistory {
            signatures: vec![sig("a", 100)],
            listing_failures: AtomicUsize::new(2),
            ..Default::default()
        };
        let stub = Arc::new(stub);

        let collector = HistoryCollector::new(stub.clone(), fast_retry(), CollectorConfig::default());
        let obs = collector.collect(&Address::parse(WALLET).unwrap()).await.unwrap();

        assert_eq!(stub.listing_calls.load(Ordering::SeqCst), 3);
        assert_eq!(obs.sample_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_listing_fails_collection() {
        let stub = StubHistory {
            listing_failures: AtomicUsize::new(usize::MAX),
            ..Default::default()
        };
        let collector =
            HistoryCollector::new(Arc::new(stub), fast_retry(), CollectorConfig::default());
        let err = collector
            .collect(&Address::parse(WALLET).unwrap())
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test(start_paused = true)]
    async fn respects_signature_limit_and_batch_pacing() {
        let stub = Arc::new(StubHistory {
            signatures: (0..20).map(|i| sig(&format!("s{i}"), i * 10)).collect(),
            transfer_latency: Duration::from_millis(50),
            ..Default::default()
        });

        let config = CollectorConfig {
            signature_limit: 7,
            batch_size: 3,
            batch_delay: Duration::from_millis(200),
        };
        let collector = HistoryCollector::new(stub.clone(), fast_retry(), config);
        let start = tokio::time::Instant::now();
        let obs = collector.collect(&Address::parse(WALLET).unwrap()).await.unwrap();

        assert_eq!(obs.sample_count(), 7);
        assert_eq!(stub.transfer_calls.load(Ordering::SeqCst), 7);
        // Three batches, two pauses.
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert_eq!(stub.peak_in_flight.load(Ordering::SeqCst), 3);
        assert_eq!(stub.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_size_bounds_concurrent_fetches() {
        let stub = Arc::new(StubHistory {
            signatures: (0..9).map(|i| sig(&format!("s{i}"), i * 10)).collect(),
            transfer_latency: Duration::from_millis(50),
            ..Default::default()
        });
        let config = CollectorConfig {
            batch_size: 2,
            ..CollectorConfig::default()
        };
        let collector = HistoryCollector::new(stub.clone(), fast_retry(), config);
        collector.collect(&Address::parse(WALLET).unwrap()).await.unwrap();

        assert_eq!(stub.transfer_calls.load(Ordering::SeqCst), 9);
        assert_eq!(stub.peak_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn balance_goes_through_source() {
        let collector = HistoryCollector::new(
            Arc::new(StubHistory::default()),
            fast_retry(),
            CollectorConfig::default(),
        );
        assert_eq!(collector.balance(&Address::parse(WALLET).unwrap()).await, Ok(0));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_history_is_empty_set() {
        let collector = HistoryCollector::new(
            Arc::new(StubHistory::default()),
            fast_retry(),
            CollectorConfig::default(),
        );
        let obs = collector.collect(&Address::parse(WALLET).unwrap()).await.unwrap();
        assert_eq!(obs, ObservationSet::default());
    }
}
