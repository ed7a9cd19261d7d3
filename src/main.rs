use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trust_score_api::config::Config;
use trust_score_api::handlers::{self, AppState};
use trust_score_api::scorer::ScoringContext;

/// Main entry point for the scoring service.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The one-time model load (any load failure leaves scoring disabled).
/// - HTTP routes and middleware (CORS, body limit, rate limiting).
///
/// The model is loaded before the listener binds, so no request can observe
/// a half-initialized context.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trust_score_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let context = ScoringContext::initialize(&config.model_path);
    if !context.is_model_loaded() {
        tracing::warn!("Starting without a model: /score will answer 503 until restarted with a valid artifact");
    }
    let state: AppState = Arc::new(context);

    // Rate limiting applies to scoring only; probes bypass it
    let mut scoring_routes = handlers::scoring_routes();
    if config.rate_limit_per_second > 0 {
        // The builder takes a replenish interval, not a rate
        let replenish_ms = (1000 / config.rate_limit_per_second).max(1);
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_millisecond(replenish_ms)
                .burst_size(config.rate_limit_burst)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
        );
        scoring_routes = scoring_routes.layer(GovernorLayer {
            config: governor_conf,
        });
        tracing::info!(
            "Rate limiting /score: {} req/s per IP, burst of {}",
            config.rate_limit_per_second,
            config.rate_limit_burst
        );
    }

    let app = Router::new()
        .merge(handlers::probe_routes())
        .merge(scoring_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
