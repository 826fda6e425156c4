//! Voting weight multiplier derived from the total score and concentration.
//!
//! | Condition               | Weight | Tier         |
//! |-------------------------|--------|--------------|
//! | `hhi > 0.8` (whale)     | 0.1    | Probationary |
//! | `total_score >= 80`     | 1.5    | Steward      |
//! | `total_score >= 40`     | 1.0    | Verified     |
//! | `total_score > 0`       | 0.1    | Probationary |
//! | `total_score == 0`      | 0.0    | blocked      |

use trustchain_core::constants::{
    BLOCKED_WEIGHT, PROBATIONARY_WEIGHT, STEWARD_MIN_SCORE, STEWARD_WEIGHT, VERIFIED_MIN_SCORE,
    VERIFIED_WEIGHT, WHALE_HHI_THRESHOLD,
};

/// Governance weight for a total score (0–100) and transfer HHI.
///
/// A dominant single position caps influence regardless of score.
///
/// # Examples
///
/// ```
/// use trustchain_integrity::governance_weight;
///
/// assert_eq!(governance_weight(90, 0.2), 1.5);
/// assert_eq!(governance_weight(90, 0.85), 0.1);
/// assert_eq!(governance_weight(0, 0.2), 0.0);
/// ```
pub fn governance_weight(total_score: u32, hhi: f64) -> f64 {
    if hhi > WHALE_HHI_THRESHOLD {
        return PROBATIONARY_WEIGHT;
    }
    match total_score {
        s if s >= STEWARD_MIN_SCORE => STEWARD_WEIGHT,
        s if s >= VERIFIED_MIN_SCORE => VERIFIED_WEIGHT,
        0 => BLOCKED_WEIGHT,
        _ => PROBATIONARY_WEIGHT,
    }
}
