//! Integrity constants. Scores are dimensionless; amounts are in the
//! smallest unit reported by the history source (lamports on Solana).

use std::time::Duration;

/// Minimum length of a base-58 encoded wallet address.
pub const ADDRESS_MIN_LEN: usize = 32;

/// Maximum length of a base-58 encoded wallet address.
pub const ADDRESS_MAX_LEN: usize = 44;

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

/// Gini returned when every sampled amount is zero.
///
/// Non-zero so that "all-zero history" stays distinguishable from
/// "computed perfect equality" for consumers that read 0 as "no data".
pub const GINI_ALL_ZERO_SENTINEL: f64 = 0.0001;

/// Gaps at or below this many seconds count as a burst.
pub const BURST_THRESHOLD_SECS: i64 = 10;

/// Fewest timestamps that produce a synchronization signal.
pub const SYNC_MIN_SAMPLES: usize = 3;

// ---------------------------------------------------------------------------
// Decision engine
// ---------------------------------------------------------------------------

/// Fewest discovered history records before a wallet can leave probation.
pub const MIN_HISTORY_RECORDS: usize = 3;

/// Fewest usable (non-zero) amounts before a wallet can leave probation.
pub const MIN_USABLE_AMOUNTS: usize = 2;

/// Gini strictly above this is Sybil under the strict regime.
pub const STRICT_GINI_SYBIL: f64 = 0.7;

/// Sync index strictly above this is Sybil under the strict regime.
pub const STRICT_SYNC_SYBIL: f64 = 0.35;

/// Gini strictly above this is Sybil under the lenient regime.
pub const LENIENT_GINI_SYBIL: f64 = 0.9;

/// Gini strictly below this is verified (when not Sybil).
pub const GINI_VERIFIED_CEILING: f64 = 0.3;

/// Weight of the local behavioral score in the total score.
pub const TRUST_CHAIN_WEIGHT: f64 = 0.7;

/// Weight of the external reputation score in the total score.
pub const FAIR_SCORE_WEIGHT: f64 = 0.3;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Stake floor (0.05 SOL) used when the floor is switched on, and the
/// balance below which a notary account reports low funds.
pub const MIN_STAKE_LAMPORTS: u64 = 50_000_000;

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// HHI strictly above this caps voting weight (whale dominance).
pub const WHALE_HHI_THRESHOLD: f64 = 0.8;

/// Minimum total score for the Steward tier.
pub const STEWARD_MIN_SCORE: u32 = 80;

/// Minimum total score for the Verified tier.
pub const VERIFIED_MIN_SCORE: u32 = 40;

pub const STEWARD_WEIGHT: f64 = 1.5;
pub const VERIFIED_WEIGHT: f64 = 1.0;
pub const PROBATIONARY_WEIGHT: f64 = 0.1;
pub const BLOCKED_WEIGHT: f64 = 0.0;

// ---------------------------------------------------------------------------
// Upstream I/O
// ---------------------------------------------------------------------------

/// Default retry budget for rate-limited upstream calls.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base backoff delay; doubles on every retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Number of recent signatures pulled per scoring request.
pub const SIGNATURE_LIMIT: usize = 15;

/// Concurrent transaction fetches per batch.
pub const FETCH_BATCH_SIZE: usize = 3;

/// Pause between transaction fetch batches.
pub const FETCH_BATCH_DELAY: Duration = Duration::from_millis(200);

/// Lifetime of a cached reputation score.
pub const REPUTATION_TTL: Duration = Duration::from_secs(60);

/// Upper bound on a single reputation lookup.
pub const REPUTATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Reputation used when the upstream is unreachable or has no record.
pub const DEFAULT_FAIR_SCORE: f64 = 50.0;

/// Basis-point scale used when encoding ratios for the ledger.
pub const NOTARY_RATIO_SCALE: f64 = 10_000.0;
