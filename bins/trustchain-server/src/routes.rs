//! Axum router and HTTP handlers.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

use trustchain_core::constants::{LAMPORTS_PER_SOL, MIN_STAKE_LAMPORTS};
use trustchain_core::error::SentinelError;
use trustchain_core::VerificationReport;
use trustchain_sentinel::Verification;

use crate::pools::{self, PoolProfile};
use crate::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin(state.config.cors_origin.as_deref()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(status))
        .route("/api/verify", post(verify_and_notarize))
        .route("/api/verify/:wallet", get(verify))
        .route("/api/pool/:id/integrity", get(pool_integrity))
        .with_state(state)
        .layer(cors)
}

fn allowed_origin(origin: Option<&str>) -> AllowOrigin {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            warn!(error = %e, "Invalid CORS origin, allowing any");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// The core output contract wrapped with request metadata.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    wallet: String,
    #[serde(flatten)]
    report: VerificationReport,
    signature: Option<String>,
    latency_ms: u64,
}

impl VerifyResponse {
    fn new(verification: Verification, started: Instant) -> Self {
        Self {
            wallet: verification.address.to_string(),
            report: verification.report,
            signature: verification.signature,
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Pool profile plus the health of the notary account that pays for writes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PoolIntegrityResponse {
    #[serde(flatten)]
    profile: PoolProfile,
    notary_balance: Option<f64>,
    status: &'static str,
    last_sync: String,
}

fn failure(err: SentinelError) -> Response {
    match err {
        SentinelError::Address(_) => invalid_address(),
        SentinelError::Fetch(e) => {
            error!(error = %e, "Verification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal Server Error",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn invalid_address() -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"status": "INVALID_ADDRESS"}))).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /`: service status.
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "SENTINEL ACTIVE",
        "version": env!("CARGO_PKG_VERSION"),
        "notary": if state.sentinel.has_notary() { "CONFIGURED" } else { "NOT CONFIGURED" },
        "regime": state.config.regime.to_string(),
        "rpc": state.config.rpc_url,
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /api/verify/:wallet`: read-only verification.
async fn verify(State(state): State<AppState>, Path(wallet): Path<String>) -> Response {
    let started = Instant::now();
    let wallet = wallet.trim();
    match state.sentinel.verify(wallet).await {
        Ok(v) => {
            info!(%wallet, status = %v.report.status, "Verification served");
            Json(VerifyResponse::new(v, started)).into_response()
        }
        Err(e) => failure(e),
    }
}

#[derive(Deserialize)]
struct VerifyRequest {
    #[serde(default)]
    address: String,
}

/// `POST /api/verify`: verification plus notarization.
async fn verify_and_notarize(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    let started = Instant::now();
    let address = req.address.trim();

    if !trustchain_core::address::is_valid_address(address) {
        return invalid_address();
    }
    if !state.sentinel.has_notary() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "Notary not configured",
                "status": "OFFLINE",
            })),
        )
            .into_response();
    }

    match state.sentinel.verify_and_notarize(address).await {
        Ok(v) => {
            info!(
                wallet = %address,
                status = %v.report.status,
                notarized = v.signature.is_some(),
                "Verification served"
            );
            Json(VerifyResponse::new(v, started)).into_response()
        }
        Err(e) => failure(e),
    }
}

/// `GET /api/pool/:id/integrity`: pool profile and notary funding.
async fn pool_integrity(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let profile = pools::profile(&id);
    let last_sync = chrono::Utc::now().to_rfc3339();

    let Some(notary_key) = state.config.notary_public_key.as_deref() else {
        return Json(PoolIntegrityResponse {
            profile,
            notary_balance: None,
            status: "OFFLINE",
            last_sync,
        })
        .into_response();
    };

    match state.sentinel.balance(notary_key).await {
        Ok(lamports) => {
            let funded = lamports >= MIN_STAKE_LAMPORTS;
            if !funded {
                warn!(pool = %id, lamports, "Notary account below operating floor");
            }
            Json(PoolIntegrityResponse {
                profile,
                notary_balance: Some(lamports as f64 / LAMPORTS_PER_SOL as f64),
                status: if funded { "ONLINE" } else { "LOW_FUNDS" },
                last_sync,
            })
            .into_response()
        }
        Err(e) => {
            error!(pool = %id, error = %e, "Pool state lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch pool state"})),
            )
                .into_response()
        }
    }
}
