//! Error types for TrustChain.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")] Empty,
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid character: {0}")] InvalidCharacter(char),
}

/// Failure of a call to the transaction history source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("http status {status}")] Http { status: u16 },
    #[error("rpc error {code}: {message}")] Rpc { code: i64, message: String },
    #[error("transport: {0}")] Transport(String),
    #[error("decode: {0}")] Decode(String),
    #[error("timeout")] Timeout,
}

impl FetchError {
    /// Whether this failure signals upstream rate limiting (a 429 marker in
    /// the status, the RPC code, or the carried message).
    pub fn is_rate_limited(&self) -> bool {
        match self {
            FetchError::Http { status } => *status == 429,
            FetchError::Rpc { code, message } => *code == 429 || message.contains("429"),
            FetchError::Transport(message) | FetchError::Decode(message) => message.contains("429"),
            FetchError::Timeout => false,
        }
    }
}

/// Failure of a call to the external reputation source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReputationError {
    #[error("no reputation record")] NotFound,
    #[error("http status {status}")] Http { status: u16 },
    #[error("transport: {0}")] Transport(String),
    #[error("decode: {0}")] Decode(String),
    #[error("timeout")] Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotaryError {
    #[error("notary rejected record: {0}")] Rejected(String),
    #[error("transport: {0}")] Transport(String),
    #[error("timeout")] Timeout,
}

/// Errors surfaced to callers of a scoring request.
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Fetch(#[from] FetchError),
}
