//! # trustchain-core
//! Foundation types, constants, and collaborator traits for TrustChain.

pub mod address;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use address::Address;
pub use types::{
    IntegrityDecision, IntegrityStatus, ObservationSet, ScoreVector, TransactionSample,
    VerificationReport,
};
