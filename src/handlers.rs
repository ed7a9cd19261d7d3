use crate::errors::AppError;
use crate::models::{BorrowerFeatures, ScoreResponse};
use crate::scorer::ScoringContext;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
pub type AppState = Arc<ScoringContext>;

/// Builds every route over an initialized scoring context, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(probe_routes())
        .merge(scoring_routes())
        .with_state(state)
}

/// `/` and `/health`. Kept apart from `/score` so the server can rate limit
/// scoring while the probes stay open.
pub fn probe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

pub fn scoring_routes() -> Router<AppState> {
    Router::new().route("/score", post(score))
}

/// GET /
///
/// Static identification message.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "CrediChain Trust Score API" }))
}

/// Health check endpoint.
///
/// Always 200; `model_loaded` reports whether scoring is available.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "model_loaded": state.is_model_loaded(),
        })),
    )
}

/// POST /score
///
/// Validates the borrower payload and returns the clamped trust score.
///
/// # Returns
///
/// * `200 {"trust_score": n}` on success.
/// * `413 {"error": ...}` when the body exceeds the size limit.
/// * `422 {"error": ...}` for a missing or mistyped field.
/// * `503 {"error": ...}` when no model is loaded.
pub async fn score(
    State(state): State<AppState>,
    payload: Result<Json<BorrowerFeatures>, JsonRejection>,
) -> Result<Json<ScoreResponse>, AppError> {
    let Json(features) = payload.map_err(|rejection| match &rejection {
        JsonRejection::BytesRejection(inner) if inner.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge(rejection.body_text())
        }
        _ => AppError::Validation(rejection.body_text()),
    })?;

    let trust_score = state.score(&features)?;
    tracing::info!(
        "POST /score - age={} volume={} defi={} streaks={} -> {}",
        features.wallet_age_days,
        features.transaction_volume_usd,
        features.defi_participation,
        features.repayment_streaks,
        trust_score
    );

    Ok(Json(ScoreResponse { trust_score }))
}
