//! # trustchain-integrity
//! Behavioral integrity kernels.
//!
//! Pure computation, no I/O. Turns an [`ObservationSet`] into a
//! [`ScoreVector`] and fuses it with an external reputation score into an
//! [`IntegrityDecision`]:
//! - **Concentration**: Gini coefficient and Herfindahl–Hirschman Index
//!   over transfer magnitudes.
//! - **Synchronization**: regularity (inverse coefficient of variation of
//!   inter-arrival gaps) and burst ratio over timestamps.
//! - **Decision engine**: ordered state machine producing
//!   `VERIFIED` / `PROBATIONARY` / `SYBIL` and the governance weight.
//! - **LP eligibility**: dual gate on reputation tier and liquidity Gini.
//!
//! [`ObservationSet`]: trustchain_core::ObservationSet
//! [`ScoreVector`]: trustchain_core::ScoreVector
//! [`IntegrityDecision`]: trustchain_core::IntegrityDecision

pub mod concentration;
pub mod decision;
pub mod eligibility;
pub mod governance;
pub mod synchronization;

pub use concentration::{gini, hhi};
pub use decision::{DecisionEngine, DecisionThresholds, SybilRegime};
pub use eligibility::{check_lp_eligibility, LiquidityEvent, LpEligibility};
pub use governance::governance_weight;
pub use synchronization::{sync_index, sync_signal, SyncConfig, SyncSignal};
