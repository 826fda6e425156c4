use std::time::Duration;

use trustchain_integrity::{DecisionThresholds, SybilRegime, SyncConfig};

use crate::history::CollectorConfig;
use crate::reputation::ReputationConfig;
use crate::retry::RetryPolicy;

/// Upper bound on one notarization round trip.
pub const DEFAULT_NOTARY_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a [`Sentinel`](crate::Sentinel) needs besides its collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelConfig {
    pub retry: RetryPolicy,
    pub collector: CollectorConfig,
    pub reputation: ReputationConfig,
    pub thresholds: DecisionThresholds,
    pub sync: SyncConfig,
    pub notary_timeout: Duration,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            collector: CollectorConfig::default(),
            reputation: ReputationConfig::default(),
            thresholds: DecisionThresholds::default(),
            sync: SyncConfig::default(),
            notary_timeout: DEFAULT_NOTARY_TIMEOUT,
        }
    }
}

impl SentinelConfig {
    /// Defaults with the decision thresholds of `regime`.
    pub fn for_regime(regime: SybilRegime) -> Self {
        Self {
            thresholds: DecisionThresholds::for_regime(regime),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let c = SentinelConfig::default();
        assert_eq!(c.retry.max_retries, 3);
        assert_eq!(c.retry.base_delay, Duration::from_millis(500));
        assert_eq!(c.collector.signature_limit, 15);
        assert_eq!(c.collector.batch_size, 3);
        assert_eq!(c.reputation.ttl, Duration::from_secs(60));
        assert_eq!(c.reputation.timeout, Duration::from_secs(3));
        assert_eq!(c.thresholds, DecisionThresholds::strict());
    }

    #[test]
    fn lenient_regime_swaps_thresholds_only() {
        let c = SentinelConfig::for_regime(SybilRegime::Lenient);
        assert_eq!(c.thresholds, DecisionThresholds::lenient());
        assert_eq!(c.collector, CollectorConfig::default());
    }
}
