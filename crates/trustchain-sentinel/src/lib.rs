//! # trustchain-sentinel
//! Scoring requests end to end.
//!
//! Wires the pure integrity kernels to their unreliable upstreams:
//! - [`retry`]: bounded exponential backoff on rate-limit failures
//! - [`rpc::SolanaRpcClient`]: JSON-RPC history source
//! - [`history::HistoryCollector`]: batched signature/transaction fetching
//! - [`reputation::ReputationCache`]: TTL cache over the FairScale score
//! - [`notary::HttpNotary`]: relay for ledger notarization
//! - [`sentinel::Sentinel`]: one verification request, start to finish

pub mod config;
pub mod history;
pub mod notary;
pub mod reputation;
pub mod retry;
pub mod rpc;
pub mod sentinel;

pub use config::SentinelConfig;
pub use history::{CollectorConfig, HistoryCollector};
pub use notary::HttpNotary;
pub use reputation::{FairScaleClient, ReputationCache, ReputationConfig};
pub use retry::{fetch_with_retry, RateLimited, RetryPolicy};
pub use rpc::SolanaRpcClient;
pub use sentinel::{Sentinel, Verification};
