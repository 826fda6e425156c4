//! One scoring request, start to finish.
//!
//! validate address → collect history ∥ reputation lookup (∥ balance, when
//! a stake floor is set) → decide → (optionally) notarize. Notarization is best-effort: its failure never
//! changes the decision returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use trustchain_core::error::SentinelError;
use trustchain_core::traits::{HistorySource, Notary, ReputationSource};
use trustchain_core::types::{IntegrityStatus, NotaryRecord};
use trustchain_core::{Address, IntegrityDecision, VerificationReport};
use trustchain_integrity::DecisionEngine;

use crate::config::SentinelConfig;
use crate::history::HistoryCollector;
use crate::reputation::ReputationCache;

/// Outcome of a scoring request.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub address: Address,
    pub decision: IntegrityDecision,
    pub report: VerificationReport,
    /// Ledger signature, when a notarization was attempted and succeeded.
    pub signature: Option<String>,
}

pub struct Sentinel {
    collector: HistoryCollector,
    reputation: ReputationCache,
    engine: DecisionEngine,
    notary: Option<Arc<dyn Notary>>,
    notary_timeout: Duration,
}

impl Sentinel {
    pub fn new(
        history: Arc<dyn HistorySource>,
        reputation: Arc<dyn ReputationSource>,
        config: SentinelConfig,
    ) -> Self {
        Self {
            collector: HistoryCollector::new(history, config.retry, config.collector),
            reputation: ReputationCache::new(reputation, config.reputation),
            engine: DecisionEngine::new(config.thresholds).with_sync_config(config.sync),
            notary: None,
            notary_timeout: config.notary_timeout,
        }
    }

    pub fn with_notary(mut self, notary: Arc<dyn Notary>) -> Self {
        self.notary = Some(notary);
        self
    }

    pub fn has_notary(&self) -> bool {
        self.notary.is_some()
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Current balance of `raw` in lamports.
    pub async fn balance(&self, raw: &str) -> Result<u64, SentinelError> {
        let address = Address::parse(raw)?;
        Ok(self.collector.balance(&address).await?)
    }

    /// Score `raw` without side effects.
    pub async fn verify(&self, raw: &str) -> Result<Verification, SentinelError> {
        let address = Address::parse(raw)?;
        let (decision, tx_count) = self.decide(&address).await?;
        Ok(Verification {
            report: VerificationReport::new(&decision, tx_count),
            address,
            decision,
            signature: None,
        })
    }

    /// Score `raw` and persist the outcome when it is conclusive.
    pub async fn verify_and_notarize(&self, raw: &str) -> Result<Verification, SentinelError> {
        let mut verification = self.verify(raw).await?;
        verification.signature = self
            .notarize(&verification.address, &verification.decision)
            .await;
        Ok(verification)
    }

    async fn decide(&self, address: &Address) -> Result<(IntegrityDecision, usize), SentinelError> {
        let stake = async {
            if self.engine.requires_stake() {
                self.collector.balance(address).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let (observations, fair_score, balance) = tokio::join!(
            self.collector.collect(address),
            self.reputation.fair_score(address),
            stake,
        );
        let observations = observations?;
        let balance = balance?;

        let decision = self
            .engine
            .evaluate_with_balance(&observations, fair_score, balance);
        info!(
            %address,
            status = %decision.status,
            total_score = decision.total_score,
            samples = observations.sample_count(),
            "sentinel: decision"
        );
        Ok((decision, observations.sample_count()))
    }

    /// Returns the ledger signature, or `None` when skipped or failed.
    async fn notarize(&self, address: &Address, decision: &IntegrityDecision) -> Option<String> {
        let notary = self.notary.as_ref()?;

        match decision.status {
            IntegrityStatus::Probationary => {
                debug!(%address, "sentinel: probationary decision not notarized");
                return None;
            }
            IntegrityStatus::Sybil => {
                warn!(
                    %address,
                    gini = decision.score_vector.gini,
                    sync_index = decision.score_vector.sync_index,
                    "sentinel: security event, Sybil behavior detected"
                );
            }
            IntegrityStatus::Verified => {}
        }

        let record = NotaryRecord::new(address.clone(), decision);
        match tokio::time::timeout(self.notary_timeout, notary.notarize(&record)).await {
            Ok(Ok(signature)) => {
                info!(%address, %signature, status = %record.status, "sentinel: decision notarized");
                Some(signature)
            }
            Ok(Err(e)) => {
                warn!(%address, error = %e, "sentinel: notarization failed");
                None
            }
            Err(_) => {
                warn!(%address, timeout_ms = self.notary_timeout.as_millis() as u64, "sentinel: notarization timed out");
                None
            }
        }
    }
}
