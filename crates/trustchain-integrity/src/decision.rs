//! Integrity decision engine.
//!
//! Pure function of an [`ObservationSet`] and a reputation score. The
//! classification is an ordered rule list, first match wins:
//!
//! 0. `PROBATIONARY`: balance below the stake floor, when one is configured.
//! 1. `PROBATIONARY`: fewer than [`MIN_HISTORY_RECORDS`] discovered records
//!    or fewer than [`MIN_USABLE_AMOUNTS`] usable amounts.
//! 2. `SYBIL`: Gini or sync index above the regime's Sybil line.
//! 3. `VERIFIED`: Gini below [`GINI_VERIFIED_CEILING`].
//! 4. `PROBATIONARY`: everything in between.
//!
//! The strict regime (`gini > 0.7 || sync_index > 0.35`) is canonical. The
//! lenient regime (`gini > 0.9`, no sync gate) exists for quick online
//! checks and has to be selected explicitly.
//!
//! The fair score handed to the engine is already on the 0–100 scale; the
//! reputation cache owns fraction scaling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use trustchain_core::constants::{
    DEFAULT_FAIR_SCORE, FAIR_SCORE_WEIGHT, GINI_VERIFIED_CEILING, LENIENT_GINI_SYBIL,
    MIN_HISTORY_RECORDS, MIN_USABLE_AMOUNTS, STRICT_GINI_SYBIL, STRICT_SYNC_SYBIL,
    TRUST_CHAIN_WEIGHT,
};
use trustchain_core::{IntegrityDecision, IntegrityStatus, ObservationSet, ScoreVector};

use crate::concentration::{gini, hhi};
use crate::governance::governance_weight;
use crate::synchronization::{sync_signal, SyncConfig};

const REASON_INSUFFICIENT: &str = "Insufficient transaction history for full analysis.";
const REASON_SYBIL: &str = "High temporal synchronization or extreme inequality detected.";
const REASON_VERIFIED: &str = "Behavior aligns with organic patterns.";
const REASON_AMBIGUOUS: &str = "Ambiguous concentration; behavior under observation.";
const REASON_STAKE_FLOOR: &str = "Institutional floor not met for notarization.";

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Named Sybil threshold regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SybilRegime {
    /// `gini > 0.7 || sync_index > 0.35`.
    #[default]
    Strict,
    /// `gini > 0.9`; timing is ignored.
    Lenient,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown Sybil regime: {0} (expected \"strict\" or \"lenient\")")]
pub struct UnknownRegime(pub String);

impl FromStr for SybilRegime {
    type Err = UnknownRegime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(UnknownRegime(other.to_string())),
        }
    }
}

impl fmt::Display for SybilRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

/// Every threshold the state machine consults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    pub min_history_records: usize,
    pub min_usable_amounts: usize,
    /// Gini strictly above this is Sybil.
    pub sybil_gini: f64,
    /// Sync index strictly above this is Sybil; `None` disables the gate.
    pub sybil_sync_index: Option<f64>,
    /// Gini strictly below this is verified.
    pub verified_gini: f64,
    /// Balance (lamports) strictly below this is probationary; `None` disables the floor.
    #[serde(default)]
    pub min_stake_lamports: Option<u64>,
}

impl DecisionThresholds {
    /// Canonical thresholds: Gini and timing gates, no stake floor.
    pub fn strict() -> Self {
        Self {
            min_history_records: MIN_HISTORY_RECORDS,
            min_usable_amounts: MIN_USABLE_AMOUNTS,
            sybil_gini: STRICT_GINI_SYBIL,
            sybil_sync_index: Some(STRICT_SYNC_SYBIL),
            verified_gini: GINI_VERIFIED_CEILING,
            min_stake_lamports: None,
        }
    }

    /// Strict with a higher Gini line and the timing gate off.
    pub fn lenient() -> Self {
        Self {
            sybil_gini: LENIENT_GINI_SYBIL,
            sybil_sync_index: None,
            ..Self::strict()
        }
    }

    /// Thresholds for a named regime.
    pub fn for_regime(regime: SybilRegime) -> Self {
        match regime {
            SybilRegime::Strict => Self::strict(),
            SybilRegime::Lenient => Self::lenient(),
        }
    }

    /// Require at least `lamports` of balance before any other rule applies.
    pub fn with_stake_floor(mut self, lamports: u64) -> Self {
        self.min_stake_lamports = Some(lamports);
        self
    }
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self::strict()
    }
}

// ---------------------------------------------------------------------------
// Derived scores
// ---------------------------------------------------------------------------

/// Local behavioral score: `round((1 - min(gini, 1)) * 100)`, or 0 when
/// there are too few usable amounts to mean anything.
pub fn trust_chain_score(gini: f64, usable_amounts: usize, min_usable_amounts: usize) -> u32 {
    if usable_amounts < min_usable_amounts {
        return 0;
    }
    let credit = (1.0 - gini.min(1.0)).max(0.0);
    (credit * 100.0).round() as u32
}

/// `round(trust_chain_score * 0.7 + fair_score * 0.3)`.
pub fn total_score(trust_chain_score: u32, fair_score: f64) -> u32 {
    let total = trust_chain_score as f64 * TRUST_CHAIN_WEIGHT + fair_score * FAIR_SCORE_WEIGHT;
    total.round().clamp(0.0, 100.0) as u32
}

/// Bring a raw upstream reputation score onto the 0–100 scale. Applied
/// once, where the upstream answer enters the system.
///
/// Values in `(0, 1]` are read as fractions; everything else is clamped.
/// Returns `None` for non-finite input.
pub fn normalize_fair_score(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    let scaled = if raw > 0.0 && raw <= 1.0 { raw * 100.0 } else { raw };
    Some(scaled.clamp(0.0, 100.0))
}

// ---------------------------------------------------------------------------
// DecisionEngine
// ---------------------------------------------------------------------------

/// The integrity state machine of record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecisionEngine {
    thresholds: DecisionThresholds,
    sync: SyncConfig,
}

impl DecisionEngine {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self {
            thresholds,
            sync: SyncConfig::default(),
        }
    }

    pub fn with_sync_config(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    pub fn requires_stake(&self) -> bool {
        self.thresholds.min_stake_lamports.is_some()
    }

    /// False when a floor is configured and `balance` is below it or unknown.
    pub fn stake_floor_met(&self, balance: Option<u64>) -> bool {
        match self.thresholds.min_stake_lamports {
            None => true,
            Some(floor) => balance.is_some_and(|b| b >= floor),
        }
    }

    /// Reduce observations to the three behavioral scalars.
    pub fn score(&self, observations: &ObservationSet) -> ScoreVector {
        ScoreVector {
            gini: gini(observations.amounts()),
            hhi: hhi(observations.amounts()),
            sync_index: sync_signal(observations.timestamps(), &self.sync).sync_index,
        }
    }

    /// Apply the ordered rules. Returns the status and its reason.
    pub fn classify(
        &self,
        sample_count: usize,
        usable_amounts: usize,
        scores: &ScoreVector,
    ) -> (IntegrityStatus, &'static str) {
        let t = &self.thresholds;

        if sample_count < t.min_history_records || usable_amounts < t.min_usable_amounts {
            return (IntegrityStatus::Probationary, REASON_INSUFFICIENT);
        }

        let sync_flagged = t
            .sybil_sync_index
            .is_some_and(|limit| scores.sync_index > limit);
        if scores.gini > t.sybil_gini || sync_flagged {
            return (IntegrityStatus::Sybil, REASON_SYBIL);
        }

        if scores.gini < t.verified_gini {
            return (IntegrityStatus::Verified, REASON_VERIFIED);
        }

        (IntegrityStatus::Probationary, REASON_AMBIGUOUS)
    }

    /// Full decision from observations and a 0–100 reputation score.
    pub fn evaluate(&self, observations: &ObservationSet, fair_score: f64) -> IntegrityDecision {
        self.evaluate_with_balance(observations, fair_score, None)
    }

    /// Like [`evaluate`](Self::evaluate), checking `balance` against the
    /// stake floor first.
    pub fn evaluate_with_balance(
        &self,
        observations: &ObservationSet,
        fair_score: f64,
        balance: Option<u64>,
    ) -> IntegrityDecision {
        let scores = self.score(observations);
        self.evaluate_scores(
            observations.sample_count(),
            observations.amounts().len(),
            scores,
            fair_score,
            balance,
        )
    }

    /// Full decision from pre-computed scores.
    pub fn evaluate_scores(
        &self,
        sample_count: usize,
        usable_amounts: usize,
        scores: ScoreVector,
        fair_score: f64,
        balance: Option<u64>,
    ) -> IntegrityDecision {
        let fair_score = if fair_score.is_finite() {
            fair_score.clamp(0.0, 100.0)
        } else {
            DEFAULT_FAIR_SCORE
        };
        let (status, reason) = if self.stake_floor_met(balance) {
            self.classify(sample_count, usable_amounts, &scores)
        } else {
            (IntegrityStatus::Probationary, REASON_STAKE_FLOOR)
        };

        let trust_chain_score =
            trust_chain_score(scores.gini, usable_amounts, self.thresholds.min_usable_amounts);
        let total_score = total_score(trust_chain_score, fair_score);
        let governance_weight = governance_weight(total_score, scores.hhi);

        debug!(
            %status,
            gini = scores.gini,
            hhi = scores.hhi,
            sync_index = scores.sync_index,
            total_score,
            governance_weight,
            "integrity: decision evaluated"
        );

        IntegrityDecision {
            status,
            reason: reason.to_string(),
            score_vector: scores,
            trust_chain_score,
            fair_score,
            total_score,
            governance_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> DecisionEngine {
        DecisionEngine::default()
    }

    fn scores(gini: f64, hhi: f64, sync_index: f64) -> ScoreVector {
        ScoreVector {
            gini,
            hhi,
            sync_index,
        }
    }

    // --- classify ---

    #[test]
    fn too_few_records_is_probationary() {
        let (status, reason) = strict().classify(2, 2, &scores(0.0, 0.5, 0.0));
        assert_eq!(status, IntegrityStatus::Probationary);
        assert_eq!(reason, REASON_INSUFFICIENT);
    }

    #[test]
    fn too_few_amounts_is_probationary_even_if_extreme() {
        let (status, _) = strict().classify(15, 1, &scores(0.99, 1.0, 1.0));
        assert_eq!(status, IntegrityStatus::Probationary);
    }

    #[test]
    fn strict_gini_gate() {
        assert_eq!(strict().classify(5, 5, &scores(0.71, 0.3, 0.0)).0, IntegrityStatus::Sybil);
        assert_ne!(strict().classify(5, 5, &scores(0.7, 0.3, 0.0)).0, IntegrityStatus::Sybil);
    }

    #[test]
    fn strict_sync_gate() {
        assert_eq!(strict().classify(5, 5, &scores(0.1, 0.3, 0.36)).0, IntegrityStatus::Sybil);
        assert_eq!(
            strict().classify(5, 5, &scores(0.1, 0.3, 0.35)).0,
            IntegrityStatus::Verified
        );
    }

    #[test]
    fn lenient_ignores_timing() {
        let engine = DecisionEngine::new(DecisionThresholds::lenient());
        assert_eq!(engine.classify(5, 5, &scores(0.1, 0.3, 1.0)).0, IntegrityStatus::Verified);
        assert_eq!(engine.classify(5, 5, &scores(0.8, 0.3, 0.0)).0, IntegrityStatus::Probationary);
        assert_eq!(engine.classify(5, 5, &scores(0.91, 0.3, 0.0)).0, IntegrityStatus::Sybil);
    }

    #[test]
    fn gray_zone_is_probationary() {
        let (status, reason) = strict().classify(5, 5, &scores(0.3, 0.3, 0.0));
        assert_eq!(status, IntegrityStatus::Probationary);
        assert_eq!(reason, REASON_AMBIGUOUS);
        assert_eq!(strict().classify(5, 5, &scores(0.29, 0.3, 0.0)).0, IntegrityStatus::Verified);
    }

    // --- derived scores ---

    #[test]
    fn trust_chain_score_from_gini() {
        assert_eq!(trust_chain_score(0.0, 5, 2), 100);
        assert_eq!(trust_chain_score(0.25, 5, 2), 75);
        assert_eq!(trust_chain_score(1.5, 5, 2), 0);
        assert_eq!(trust_chain_score(0.0001, 5, 2), 100);
    }

    #[test]
    fn trust_chain_score_zero_without_signal() {
        assert_eq!(trust_chain_score(0.0, 1, 2), 0);
        assert_eq!(trust_chain_score(0.0, 0, 2), 0);
    }

    #[test]
    fn total_score_weighting() {
        assert_eq!(total_score(100, 50.0), 85);
        assert_eq!(total_score(0, 50.0), 15);
        assert_eq!(total_score(75, 73.4), 75);
        assert_eq!(total_score(100, 100.0), 100);
    }

    #[test]
    fn fair_score_normalisation() {
        assert_eq!(normalize_fair_score(0.5), Some(50.0));
        assert_eq!(normalize_fair_score(1.0), Some(100.0));
        assert_eq!(normalize_fair_score(0.0), Some(0.0));
        assert_eq!(normalize_fair_score(72.0), Some(72.0));
        assert_eq!(normalize_fair_score(250.0), Some(100.0));
        assert_eq!(normalize_fair_score(-3.0), Some(0.0));
        assert_eq!(normalize_fair_score(f64::NAN), None);
        assert_eq!(normalize_fair_score(f64::INFINITY), None);
    }

    // --- evaluate ---

    #[test]
    fn evaluate_irregular_wallet_is_verified() {
        // Short busy stretch then a long dormancy: cv ≈ 2.45, no bursts.
        let obs = ObservationSet::new(
            vec![1_000, 1_200, 900, 1_100],
            vec![0, 15, 35, 47, 77, 102, 120, 2_000_120],
            8,
        );
        let d = strict().evaluate(&obs, 80.0);
        assert_eq!(d.status, IntegrityStatus::Verified);
        assert!(d.trust_chain_score >= 90);
        assert_eq!(d.fair_score, 80.0);
        assert_eq!(d.governance_weight, 1.5);
        assert_eq!(d.governance().tier, trustchain_core::types::GovernanceTier::Steward);
    }

    #[test]
    fn evaluate_steady_cadence_is_sybil_under_strict_only() {
        let obs = ObservationSet::new(
            vec![1_000, 1_200, 900, 1_100],
            vec![0, 3_700, 90_000, 200_000],
            6,
        );
        assert_eq!(strict().evaluate(&obs, 80.0).status, IntegrityStatus::Sybil);
        let lenient = DecisionEngine::new(DecisionThresholds::lenient());
        assert_eq!(lenient.evaluate(&obs, 80.0).status, IntegrityStatus::Verified);
    }

    #[test]
    fn evaluate_new_wallet_gets_only_reputation_credit() {
        let obs = ObservationSet::new(vec![500], vec![10], 1);
        let d = strict().evaluate(&obs, 50.0);
        assert_eq!(d.status, IntegrityStatus::Probationary);
        assert_eq!(d.trust_chain_score, 0);
        assert_eq!(d.total_score, 15);
        assert_eq!(d.governance_weight, 0.1);
    }

    #[test]
    fn evaluate_whale_extraction_is_sybil() {
        let obs = ObservationSet::new(vec![1_000_000, 1, 1, 1], vec![], 4);
        let d = strict().evaluate(&obs, 50.0);
        assert_eq!(d.status, IntegrityStatus::Sybil);
        assert!(d.score_vector.hhi > 0.8);
        assert_eq!(d.governance_weight, 0.1);
    }

    #[test]
    fn evaluate_clamps_bad_fair_score() {
        let obs = ObservationSet::new(vec![10, 10, 10], vec![], 3);
        assert_eq!(strict().evaluate(&obs, f64::NAN).fair_score, DEFAULT_FAIR_SCORE);
        assert_eq!(strict().evaluate(&obs, 250.0).fair_score, 100.0);
        assert_eq!(strict().evaluate(&obs, -4.0).fair_score, 0.0);
    }

    #[test]
    fn evaluate_does_not_rescale_small_fair_scores() {
        let obs = ObservationSet::new(vec![10, 10, 10], vec![], 3);
        let d = strict().evaluate(&obs, 0.8);
        assert_eq!(d.fair_score, 0.8);
        assert_eq!(d.total_score, 70);
    }

    // --- stake floor ---

    #[test]
    fn stake_floor_is_off_by_default() {
        assert!(!strict().requires_stake());
        assert!(strict().stake_floor_met(None));
        assert!(strict().stake_floor_met(Some(0)));
    }

    #[test]
    fn stake_floor_preempts_every_other_rule() {
        let engine = DecisionEngine::new(DecisionThresholds::strict().with_stake_floor(50_000_000));
        let organic = ObservationSet::new(vec![1_000, 1_200, 900, 1_100], vec![], 4);

        let poor = engine.evaluate_with_balance(&organic, 80.0, Some(49_999_999));
        assert_eq!(poor.status, IntegrityStatus::Probationary);
        assert_eq!(poor.reason, REASON_STAKE_FLOOR);
        assert_eq!(poor.fair_score, 80.0);

        let funded = engine.evaluate_with_balance(&organic, 80.0, Some(50_000_000));
        assert_eq!(funded.status, IntegrityStatus::Verified);

        let whale = ObservationSet::new(vec![1_000_000, 1, 1, 1], vec![], 4);
        assert_eq!(
            engine.evaluate_with_balance(&whale, 50.0, Some(0)).status,
            IntegrityStatus::Probationary
        );
    }

    #[test]
    fn unknown_balance_fails_a_configured_floor() {
        let engine = DecisionEngine::new(DecisionThresholds::strict().with_stake_floor(1));
        assert!(engine.requires_stake());
        assert!(!engine.stake_floor_met(None));
    }

    #[test]
    fn regime_parsing() {
        assert_eq!("strict".parse::<SybilRegime>(), Ok(SybilRegime::Strict));
        assert_eq!(" Lenient ".parse::<SybilRegime>(), Ok(SybilRegime::Lenient));
        assert!("average".parse::<SybilRegime>().is_err());
        assert_eq!(SybilRegime::default().to_string(), "strict");
    }
}
