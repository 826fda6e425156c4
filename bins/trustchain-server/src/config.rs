//! Server configuration loaded from environment variables.

use anyhow::{Context, Result};
use trustchain_integrity::SybilRegime;
use trustchain_sentinel::reputation::DEFAULT_FAIRSCALE_URL;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

#[derive(Clone, Debug)]
pub struct Config {
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Solana JSON-RPC endpoint for transaction history.
    pub rpc_url: String,
    /// FairScale API base URL.
    pub fairscale_url: String,
    /// Notary relay endpoint. Without one, `POST /api/verify` is offline.
    pub notary_endpoint: Option<String>,
    /// Account paying for notary writes; its balance is reported per pool.
    pub notary_public_key: Option<String>,
    /// Allowed CORS origin; any origin when unset.
    pub cors_origin: Option<String>,
    pub regime: SybilRegime,
    /// Minimum wallet balance in lamports; unset disables the stake floor.
    pub stake_floor_lamports: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("TRUSTCHAIN_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let rpc_url = var("SOLANA_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let fairscale_url =
            var("FAIRSCALE_API_URL").unwrap_or_else(|| DEFAULT_FAIRSCALE_URL.to_string());
        let notary_endpoint = var("NOTARY_ENDPOINT");
        let notary_public_key = var("NOTARY_PUBLIC_KEY");
        let cors_origin = var("TRUSTCHAIN_CORS_ORIGIN");

        let regime = match var("TRUSTCHAIN_SYBIL_REGIME") {
            Some(raw) => raw
                .parse()
                .context("TRUSTCHAIN_SYBIL_REGIME must be \"strict\" or \"lenient\"")?,
            None => SybilRegime::default(),
        };

        let stake_floor_lamports = var("TRUSTCHAIN_STAKE_FLOOR_LAMPORTS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .context("TRUSTCHAIN_STAKE_FLOOR_LAMPORTS must be a whole number of lamports")
            })
            .transpose()?;

        Ok(Config {
            bind_addr,
            rpc_url,
            fairscale_url,
            notary_endpoint,
            notary_public_key,
            cors_origin,
            regime,
            stake_floor_lamports,
        })
    }
}
