//! Temporal synchronization of a wallet's activity.
//!
//! Two signals are read from the gaps between consecutive timestamps:
//!
//! - **Regularity**: `1 / (1 + cv)` where `cv` is the coefficient of
//!   variation (population std-dev over mean) of the gaps. A metronomic
//!   cadence gives `cv ≈ 0` and a value near 1; organic, irregular activity
//!   pushes it towards 0. A zero mean gap (every event at the same instant)
//!   is maximal regularity.
//! - **Burst ratio**: fraction of gaps at or below the burst threshold.
//!
//! The index is the larger of the two. Either one alone is enough to flag
//! scripted timing, so they are never averaged.

use serde::{Deserialize, Serialize};
use trustchain_core::constants::{BURST_THRESHOLD_SECS, SYNC_MIN_SAMPLES};

/// Tuning for [`sync_signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Gaps `<=` this (in timestamp units) are bursts.
    pub burst_threshold: i64,
    /// Fewer timestamps than this produce no signal. Never below 2.
    pub min_samples: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            burst_threshold: BURST_THRESHOLD_SECS,
            min_samples: SYNC_MIN_SAMPLES,
        }
    }
}

/// Components of the synchronization index, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSignal {
    pub sync_index: f64,
    pub regularity: f64,
    pub burst_ratio: f64,
}

/// Synchronization signal of `timestamps` (any order).
///
/// Too few timestamps is "no signal": all components are zero.
pub fn sync_signal(timestamps: &[i64], config: &SyncConfig) -> SyncSignal {
    if timestamps.len() < config.min_samples.max(2) {
        return SyncSignal::default();
    }

    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let gaps: Vec<i64> = sorted
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]))
        .collect();
    let count = gaps.len() as f64;

    let mean = gaps.iter().map(|&g| g as f64).sum::<f64>() / count;
    let regularity = if mean == 0.0 {
        1.0
    } else {
        let variance = gaps
            .iter()
            .map(|&g| {
                let d = g as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / count;
        let cv = variance.sqrt() / mean;
        1.0 / (1.0 + cv)
    };

    let bursts = gaps.iter().filter(|&&g| g <= config.burst_threshold).count();
    let burst_ratio = bursts as f64 / count;

    SyncSignal {
        sync_index: regularity.max(burst_ratio),
        regularity,
        burst_ratio,
    }
}

/// Synchronization index with the default burst threshold.
pub fn sync_index(timestamps: &[i64]) -> f64 {
    sync_signal(timestamps, &SyncConfig::default()).sync_index
}
