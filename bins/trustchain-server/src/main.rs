//! trustchain-server: HTTP front end for wallet integrity scoring.
//!
//! Serves a status document at `/`, read-only verification at
//! `GET /api/verify/:wallet`, and verification plus ledger notarization at
//! `POST /api/verify`, and pool integrity with notary funding at
//! `GET /api/pool/:id/integrity`. Notarization is offline unless a notary
//! relay is configured.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod config;
mod pools;
mod routes;

use config::Config;
use trustchain_sentinel::{
    FairScaleClient, HttpNotary, Sentinel, SentinelConfig, SolanaRpcClient,
};

/// TrustChain Sentinel: behavioral integrity scoring for Solana wallets.
#[derive(Parser, Debug)]
#[command(name = "trustchain-server", version)]
struct Args {
    /// HTTP bind address (overrides TRUSTCHAIN_BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,
}

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub sentinel: Arc<Sentinel>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, &args.log_format);

    let mut config = Config::from_env().context("Failed to load server configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    info!(
        rpc = %config.rpc_url,
        fairscale = %config.fairscale_url,
        bind = %config.bind_addr,
        regime = %config.regime,
        "Starting trustchain-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let history = SolanaRpcClient::new(&config.rpc_url).context("Failed to build RPC client")?;
    let reputation =
        FairScaleClient::new(&config.fairscale_url).context("Failed to build FairScale client")?;

    let mut sentinel_config = SentinelConfig::for_regime(config.regime);
    if let Some(floor) = config.stake_floor_lamports {
        sentinel_config.thresholds = sentinel_config.thresholds.with_stake_floor(floor);
        info!(lamports = floor, "Stake floor enabled");
    }
    let mut sentinel = Sentinel::new(Arc::new(history), Arc::new(reputation), sentinel_config);
    match &config.notary_endpoint {
        Some(endpoint) => {
            let notary = HttpNotary::new(endpoint).context("Failed to build notary client")?;
            sentinel = sentinel.with_notary(Arc::new(notary));
            info!(%endpoint, "Notary relay configured");
        }
        None => warn!("NOTARY_ENDPOINT not set; POST /api/verify will report OFFLINE"),
    }

    let state = AppState {
        sentinel: Arc::new(sentinel),
        config: Arc::new(config.clone()),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over
/// `level_str`.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
