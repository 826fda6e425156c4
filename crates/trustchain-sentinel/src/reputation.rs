//! External reputation lookup with a TTL cache.
//!
//! [`ReputationCache::fair_score`] never fails. Upstream errors, timeouts,
//! and non-finite values all resolve to the configured default score, and
//! the default is cached like any other answer. Each insert schedules a
//! best-effort eviction after the TTL; lookups also treat stale entries as
//! misses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};
use trustchain_core::constants::{DEFAULT_FAIR_SCORE, REPUTATION_TIMEOUT, REPUTATION_TTL};
use trustchain_core::error::ReputationError;
use trustchain_core::traits::ReputationSource;
use trustchain_core::Address;
use trustchain_integrity::decision::normalize_fair_score;

pub const DEFAULT_FAIRSCALE_URL: &str = "https://sales.fairscale.xyz";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReputationConfig {
    pub ttl: Duration,
    /// Upper bound on one upstream lookup.
    pub timeout: Duration,
    /// Score used when the upstream has no usable answer (0–100 scale).
    pub default_score: f64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            ttl: REPUTATION_TTL,
            timeout: REPUTATION_TIMEOUT,
            default_score: DEFAULT_FAIR_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReputationRecord {
    pub score: f64,
    pub cached_at: Instant,
}

pub struct ReputationCache {
    source: Arc<dyn ReputationSource>,
    entries: Arc<DashMap<Address, ReputationRecord>>,
    config: ReputationConfig,
}

impl ReputationCache {
    pub fn new(source: Arc<dyn ReputationSource>, config: ReputationConfig) -> Self {
        Self {
            source,
            entries: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Reputation score for `address` on the 0–100 scale.
    pub async fn fair_score(&self, address: &Address) -> f64 {
        let now = Instant::now();
        if let Some(score) = self.lookup(address, now) {
            debug!(%address, score, "reputation: cache hit");
            return score;
        }

        let score = self.fetch(address).await;
        self.entries.insert(
            address.clone(),
            ReputationRecord {
                score,
                cached_at: now,
            },
        );
        self.schedule_eviction(address.clone());
        score
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, address: &Address, now: Instant) -> Option<f64> {
        // Copy out before touching the map again; holding a shard guard
        // across remove_if would deadlock.
        let record = self.entries.get(address).map(|entry| *entry)?;
        if now.saturating_duration_since(record.cached_at) < self.config.ttl {
            return Some(record.score);
        }
        let ttl = self.config.ttl;
        self.entries
            .remove_if(address, |_, r| now.saturating_duration_since(r.cached_at) >= ttl);
        None
    }

    async fn fetch(&self, address: &Address) -> f64 {
        let default = self.config.default_score;
        match tokio::time::timeout(self.config.timeout, self.source.fetch_score(address)).await {
            Ok(Ok(raw)) => normalize_fair_score(raw).unwrap_or_else(|| {
                warn!(%address, raw, "reputation: non-finite score, using default");
                default
            }),
            Ok(Err(ReputationError::NotFound)) => {
                debug!(%address, "reputation: no record, using default");
                default
            }
            Ok(Err(e)) => {
                warn!(%address, error = %e, "reputation: lookup failed, using default");
                default
            }
            Err(_) => {
                warn!(%address, timeout_ms = self.config.timeout.as_millis() as u64, "reputation: lookup timed out, using default");
                default
            }
        }
    }

    fn schedule_eviction(&self, address: Address) {
        let entries = Arc::downgrade(&self.entries);
        let ttl = self.config.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(entries) = entries.upgrade() {
                entries.remove_if(&address, |_, r| r.cached_at.elapsed() >= ttl);
            }
        });
    }
}

/// HTTP client for the FairScale score endpoint.
pub struct FairScaleClient {
    client: Client,
    base_url: String,
}

impl FairScaleClient {
    pub fn new(base_url: &str) -> Result<Self, ReputationError> {
        let client = Client::builder()
            .timeout(REPUTATION_TIMEOUT)
            .build()
            .map_err(|e| ReputationError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn score_url(&self, address: &Address) -> String {
        format!("{}/api/score/{}", self.base_url, address)
    }
}

#[async_trait]
impl ReputationSource for FairScaleClient {
    async fn fetch_score(&self, address: &Address) -> Result<f64, ReputationError> {
        let resp = self
            .client
            .get(self.score_url(address))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReputationError::Timeout
                } else {
                    ReputationError::Transport(e.to_string())
                }
            })?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(ReputationError::NotFound),
            s if !s.is_success() => return Err(ReputationError::Http { status: s.as_u16() }),
            _ => {}
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ReputationError::Decode(e.to_string()))?;
        parse_score(&body)
    }
}

fn parse_score(body: &Value) -> Result<f64, ReputationError> {
    body.get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| ReputationError::Decode(format!("unexpected response: {body}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    enum Behavior {
        Score(f64),
        Fail(ReputationError),
        Hang,
    }

    struct StubReputation {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubReputation {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReputationSource for StubReputation {
        async fn fetch_score(&self, _address: &Address) -> Result<f64, ReputationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Score(s) => Ok(*s),
                Behavior::Fail(e) => Err(e.clone()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3_600)).await;
                    Ok(99.0)
                }
            }
        }
    }

    fn wallet() -> Address {
        Address::parse(WALLET).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn second_lookup_within_ttl_is_cached() {
        let stub = StubReputation::new(Behavior::Score(72.0));
        let cache = ReputationCache::new(stub.clone(), ReputationConfig::default());

        assert_eq!(cache.fair_score(&wallet()).await, 72.0);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cache.fair_score(&wallet()).await, 72.0);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_after_ttl_goes_upstream() {
        let stub = StubReputation::new(Behavior::Score(72.0));
        let cache = ReputationCache::new(stub.clone(), ReputationConfig::default());

        cache.fair_score(&wallet()).await;
        tokio::time::sleep(Duration::from_secs(61)).await;
        cache.fair_score(&wallet()).await;
        assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_evicted() {
        let stub = StubReputation::new(Behavior::Score(72.0));
        let cache = ReputationCache::new(stub, ReputationConfig::default());

        cache.fair_score(&wallet()).await;
        assert_eq!(cache.len(), 1);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fraction_is_scaled() {
        let stub = StubReputation::new(Behavior::Score(0.85));
        let cache = ReputationCache::new(stub, ReputationConfig::default());
        assert!((cache.fair_score(&wallet()).await - 85.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_yields_cached_default() {
        let stub = StubReputation::new(Behavior::Fail(ReputationError::Http { status: 500 }));
        let cache = ReputationCache::new(stub.clone(), ReputationConfig::default());

        assert_eq!(cache.fair_score(&wallet()).await, 50.0);
        assert_eq!(cache.fair_score(&wallet()).await, 50.0);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_yields_default() {
        let stub = StubReputation::new(Behavior::Fail(ReputationError::NotFound));
        let cache = ReputationCache::new(stub, ReputationConfig::default());
        assert_eq!(cache.fair_score(&wallet()).await, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_yields_default() {
        let stub = StubReputation::new(Behavior::Score(f64::NAN));
        let cache = ReputationCache::new(stub, ReputationConfig::default());
        assert_eq!(cache.fair_score(&wallet()).await, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_upstream_times_out_to_default() {
        let stub = StubReputation::new(Behavior::Hang);
        let cache = ReputationCache::new(stub, ReputationConfig::default());
        let start = Instant::now();

        assert_eq!(cache.fair_score(&wallet()).await, 50.0);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(3));
        assert!(waited < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_default_is_used() {
        let stub = StubReputation::new(Behavior::Fail(ReputationError::Timeout));
        let config = ReputationConfig {
            default_score: 10.0,
            ..Default::default()
        };
        let cache = ReputationCache::new(stub, config);
        assert_eq!(cache.fair_score(&wallet()).await, 10.0);
    }

    #[test]
    fn parses_score_field() {
        assert_eq!(parse_score(&json!({ "score": 64.5, "tier": 3 })).unwrap(), 64.5);
        assert_eq!(parse_score(&json!({ "score": 1 })).unwrap(), 1.0);
        assert!(matches!(
            parse_score(&json!({ "tier": 3 })),
            Err(ReputationError::Decode(_))
        ));
    }

    #[test]
    fn score_url_trims_trailing_slash() {
        let client = FairScaleClient::new("https://scores.example/").unwrap();
        assert_eq!(
            client.score_url(&wallet()),
            format!("https://scores.example/api/score/{WALLET}")
        );
    }
}
