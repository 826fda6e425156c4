//! Liquidity-provider eligibility: a dual gate on external reputation tier
//! and the inequality of liquidity moved across wallets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::concentration::gini;

/// Only the most recent events are considered.
pub const LP_EVENT_WINDOW: usize = 50;

/// Reputation tiers below this are treated as Sybil risk.
pub const LP_MIN_FAIR_TIER: u8 = 2;

/// Liquidity Gini above this is extractive.
pub const LP_MAX_GINI: f64 = 0.3;

/// A signed liquidity movement attributed to a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityEvent {
    pub wallet: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpEligibility {
    pub eligible: bool,
    pub reason: Option<String>,
    pub gini: f64,
}

/// Decide whether a pool participant may provide liquidity.
///
/// The last [`LP_EVENT_WINDOW`] events are folded into per-wallet absolute
/// volumes and the Gini across wallets is computed. Ineligible when the
/// reputation tier is below [`LP_MIN_FAIR_TIER`] or the Gini exceeds
/// [`LP_MAX_GINI`]; the tier check takes precedence.
pub fn check_lp_eligibility(fair_score_tier: u8, events: &[LiquidityEvent]) -> LpEligibility {
    let recent = &events[events.len().saturating_sub(LP_EVENT_WINDOW)..];

    let mut volumes: BTreeMap<&str, u64> = BTreeMap::new();
    for event in recent {
        let volume = volumes.entry(event.wallet.as_str()).or_insert(0);
        *volume = volume.saturating_add(event.amount.unsigned_abs());
    }
    let volumes: Vec<u64> = volumes.into_values().collect();
    let gini = gini(&volumes);

    if fair_score_tier < LP_MIN_FAIR_TIER {
        return LpEligibility {
            eligible: false,
            reason: Some("FairScale tier insufficient (Sybil risk)".to_string()),
            gini,
        };
    }
    if gini > LP_MAX_GINI {
        return LpEligibility {
            eligible: false,
            reason: Some("Gini coefficient too high (extractive behavior)".to_string()),
            gini,
        };
    }

    LpEligibility {
        eligible: true,
        reason: None,
        gini,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(wallet: &str, amount: i64) -> LiquidityEvent {
        LiquidityEvent {
            wallet: wallet.to_string(),
            amount,
        }
    }

    #[test]
    fn balanced_pool_with_good_tier_is_eligible() {
        let events = [ev("a", 100), ev("b", -100), ev("c", 50), ev("c", 50)];
        let result = check_lp_eligibility(3, &events);
        assert!(result.eligible);
        assert_eq!(result.reason, None);
        assert_eq!(result.gini, 0.0);
    }

    #[test]
    fn low_tier_is_rejected_first() {
        let events = [ev("a", 100), ev("b", 100)];
        let result = check_lp_eligibility(1, &events);
        assert!(!result.eligible);
        assert!(result.reason.unwrap().contains("Sybil"));
        assert_eq!(result.gini, 0.0);
    }

    #[test]
    fn extractive_pool_is_rejected() {
        let events = [ev("whale", 1_000_000), ev("a", 10), ev("b", -10), ev("c", 10)];
        let result = check_lp_eligibility(4, &events);
        assert!(!result.eligible);
        assert!(result.gini > LP_MAX_GINI);
        assert!(result.reason.unwrap().contains("extractive"));
    }

    #[test]
    fn only_recent_window_counts() {
        let mut events: Vec<LiquidityEvent> = (0..10).map(|_| ev("whale", 1_000_000)).collect();
        events.extend((0..LP_EVENT_WINDOW).map(|i| ev(if i % 2 == 0 { "a" } else { "b" }, 10)));
        let result = check_lp_eligibility(2, &events);
        assert!(result.eligible, "old whale events should fall out of the window");
    }

    #[test]
    fn empty_history_is_eligible_with_zero_gini() {
        let result = check_lp_eligibility(2, &[]);
        assert!(result.eligible);
        assert_eq!(result.gini, 0.0);
    }
}
