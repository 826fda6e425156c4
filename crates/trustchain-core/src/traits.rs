//! Collaborator interfaces at the edge of the integrity core.
//!
//! - [`HistorySource`]: raw transaction history (Solana JSON-RPC in production)
//! - [`ReputationSource`]: external social reputation (FairScale)
//! - [`Notary`]: persists decisions to a ledger-backed record
//!
//! Implementations live in `trustchain-sentinel`; tests provide stubs.

use async_trait::async_trait;

use crate::address::Address;
use crate::error::{FetchError, NotaryError, ReputationError};
use crate::types::{NotaryRecord, SignatureRecord, TransferRecord};

/// Source of an address's recent transaction history.
///
/// Either call may fail with a rate-limit class [`FetchError`]; callers
/// wrap them in the retry discipline.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Most recent signatures involving `address`, newest first, at most `limit`.
    async fn recent_signatures(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, FetchError>;

    /// Balance state of one transaction. `Ok(None)` when the source has no
    /// record or no metadata for it.
    async fn transfer(&self, signature: &str) -> Result<Option<TransferRecord>, FetchError>;

    /// Current balance of `address` in lamports.
    async fn balance(&self, address: &Address) -> Result<u64, FetchError>;
}

/// Source of an external reputation score for an address.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Raw score as reported upstream. May be a fraction in `(0, 1]`, a
    /// value on the 0–100 scale, or garbage; normalisation is the caller's job.
    ///
    /// [`ReputationError::NotFound`] is the expected answer for unseen addresses.
    async fn fetch_score(&self, address: &Address) -> Result<f64, ReputationError>;
}

/// Persistence side effect for a decision.
#[async_trait]
pub trait Notary: Send + Sync {
    /// Persist `record`, returning the ledger signature of the write.
    async fn notarize(&self, record: &NotaryRecord) -> Result<String, NotaryError>;
}
