//! Core integrity types: samples, observations, scores, decisions.
//!
//! Everything here is constructed once per scoring request and never
//! mutated afterwards. Serialized field names follow the camelCase JSON
//! contract consumed by the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::constants::{NOTARY_RATIO_SCALE, STEWARD_WEIGHT, VERIFIED_WEIGHT};

// ---------------------------------------------------------------------------
// Raw history
// ---------------------------------------------------------------------------

/// One entry from an address's signature listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub signature: String,
    /// Block time in Unix seconds, when the source reports one.
    pub block_time: Option<i64>,
}

/// Balance state of one parsed transaction.
///
/// `pre_balances[i]` and `post_balances[i]` belong to `account_keys[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub account_keys: Vec<String>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub block_time: Option<i64>,
}

impl TransferRecord {
    /// Absolute balance change of `address` in this transaction, or `None`
    /// if the address is not among the account keys. Missing balance
    /// entries read as zero.
    pub fn balance_delta(&self, address: &Address) -> Option<u64> {
        let index = self
            .account_keys
            .iter()
            .position(|key| key == address.as_str())?;
        let pre = self.pre_balances.get(index).copied().unwrap_or(0);
        let post = self.post_balances.get(index).copied().unwrap_or(0);
        Some(pre.abs_diff(post))
    }
}

/// One observed balance-changing event for the subject address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSample {
    /// Magnitude of value moved. Zero when no delta could be extracted.
    pub amount: u64,
    pub timestamp: Option<i64>,
}

// ---------------------------------------------------------------------------
// ObservationSet
// ---------------------------------------------------------------------------

/// Aggregate scoring input for one address.
///
/// # Invariants
///
/// * `sample_count >= amounts.len()`
/// * every entry of `amounts` is non-zero
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSet {
    amounts: Vec<u64>,
    timestamps: Vec<i64>,
    sample_count: usize,
}

impl ObservationSet {
    /// Build from explicit parts. Zero amounts are dropped and
    /// `sample_count` is raised to at least the number of kept amounts.
    pub fn new(amounts: Vec<u64>, timestamps: Vec<i64>, sample_count: usize) -> Self {
        let amounts: Vec<u64> = amounts.into_iter().filter(|a| *a > 0).collect();
        let sample_count = sample_count.max(amounts.len());
        Self {
            amounts,
            timestamps,
            sample_count,
        }
    }

    /// Build from one sample per discovered history record, in discovery
    /// order.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = TransactionSample>,
    {
        let mut set = Self::default();
        for sample in samples {
            set.sample_count += 1;
            if sample.amount > 0 {
                set.amounts.push(sample.amount);
            }
            if let Some(ts) = sample.timestamp {
                set.timestamps.push(ts);
            }
        }
        set
    }

    pub fn amounts(&self) -> &[u64] {
        &self.amounts
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// Number of discovered history records, usable or not.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }
}

// ---------------------------------------------------------------------------
// Scores and decisions
// ---------------------------------------------------------------------------

/// The three behavioral scalars, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreVector {
    pub gini: f64,
    pub hhi: f64,
    pub sync_index: f64,
}

/// Tiered integrity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityStatus {
    Verified,
    Probationary,
    Sybil,
}

impl IntegrityStatus {
    /// Ledger status code: 0 = verified, 1 = probationary, 2 = Sybil.
    pub fn code(&self) -> u8 {
        match self {
            Self::Verified => 0,
            Self::Probationary => 1,
            Self::Sybil => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Probationary => "PROBATIONARY",
            Self::Sybil => "SYBIL",
        }
    }

    /// Verdict label attached to decisions.
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::Verified => "AUTHORIZED_ACTOR",
            Self::Probationary | Self::Sybil => "RELEVANT_RISK_DETECTED",
        }
    }
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Governance tier label derived from the voter weight multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceTier {
    Steward,
    Verified,
    Probationary,
}

/// Governance view of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Governance {
    pub voter_weight_multiplier: f64,
    pub is_qualified: bool,
    pub tier: GovernanceTier,
}

impl Governance {
    pub fn from_weight(weight: f64) -> Self {
        let tier = if weight >= STEWARD_WEIGHT {
            GovernanceTier::Steward
        } else if weight >= VERIFIED_WEIGHT {
            GovernanceTier::Verified
        } else {
            GovernanceTier::Probationary
        };
        Self {
            voter_weight_multiplier: weight,
            is_qualified: weight > 0.0,
            tier,
        }
    }
}

/// Output of the decision engine. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityDecision {
    pub status: IntegrityStatus,
    pub reason: String,
    pub score_vector: ScoreVector,
    /// Local behavioral sub-score, 0–100.
    pub trust_chain_score: u32,
    /// External reputation sub-score, 0–100.
    pub fair_score: f64,
    /// Weighted fusion of the two sub-scores, 0–100.
    pub total_score: u32,
    /// One of 0.0, 0.1, 1.0, 1.5.
    pub governance_weight: f64,
}

impl IntegrityDecision {
    pub fn governance(&self) -> Governance {
        Governance::from_weight(self.governance_weight)
    }
}

// ---------------------------------------------------------------------------
// Output contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportScores {
    pub gini: f64,
    pub hhi: f64,
    pub sync_index: f64,
    pub total_score: u32,
    pub fair_score: f64,
    pub trust_chain_score: u32,
}

/// What the routing layer serializes for a scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub status: IntegrityStatus,
    pub reason: String,
    pub decision: String,
    pub scores: ReportScores,
    pub governance: Governance,
    pub tx_count: usize,
}

impl VerificationReport {
    pub fn new(decision: &IntegrityDecision, tx_count: usize) -> Self {
        Self {
            status: decision.status,
            reason: decision.reason.clone(),
            decision: decision.status.verdict().to_string(),
            scores: ReportScores {
                gini: decision.score_vector.gini,
                hhi: decision.score_vector.hhi,
                sync_index: decision.score_vector.sync_index,
                total_score: decision.total_score,
                fair_score: decision.fair_score,
                trust_chain_score: decision.trust_chain_score,
            },
            governance: decision.governance(),
            tx_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Notary record
// ---------------------------------------------------------------------------

/// A decision in the compact form persisted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotaryRecord {
    pub address: Address,
    pub status: IntegrityStatus,
    pub status_code: u8,
    /// Gini in basis points, saturating at `u16::MAX`.
    pub gini_bps: u16,
    /// HHI in basis points, saturating at `u16::MAX`.
    pub hhi_bps: u16,
}

impl NotaryRecord {
    pub fn new(address: Address, decision: &IntegrityDecision) -> Self {
        Self {
            address,
            status: decision.status,
            status_code: decision.status.code(),
            gini_bps: ratio_to_bps(decision.score_vector.gini),
            hhi_bps: ratio_to_bps(decision.score_vector.hhi),
        }
    }
}

/// `min(floor(ratio * 10000), 65535)`; non-finite or negative input maps to 0.
pub fn ratio_to_bps(ratio: f64) -> u16 {
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    (ratio * NOTARY_RATIO_SCALE).floor().min(u16::MAX as f64) as u16
}
