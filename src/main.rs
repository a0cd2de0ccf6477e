use anyhow::{Context, Result};
use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use freelii_orchestrator::{
    anchors::{AnchorRegistry, CoinsPhAnchor, StellarAnchor},
    config::Config,
    handlers::*,
    middleware::{verify_webhook_signature, SignatureVerifier},
    services::*,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::{BoxError, ServiceBuilder};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!(
        "Starting payment orchestrator v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize services
    let cache = Arc::new(CacheService::new(&config.redis_url).await?);

    // Registration order breaks ranking ties, so the on-network anchor
    // comes first.
    let mut registry = AnchorRegistry::new();
    registry.register(Arc::new(StellarAnchor::new()));
    registry.register(Arc::new(CoinsPhAnchor::new(
        &config.coins_ph_api_host,
        &config.coins_ph_api_key,
        &config.coins_ph_api_secret,
        config.request_timeout_secs,
        cache.clone(),
    )?));
    let registry = Arc::new(registry);

    let store = Arc::new(PaymentStore::new());
    let metrics = Arc::new(Metrics::new(cache.clone()));
    let fx = Arc::new(FxService::new(registry.get(&config.fx_anchor)?));
    let orchestrator = Arc::new(OrchestratorService::new(
        registry.clone(),
        store.clone(),
        metrics.clone(),
    ));

    let verifier = Arc::new(SignatureVerifier::new(config.webhook_secret.clone()));

    // Build application state
    let app_state = AppState {
        orchestrator: orchestrator.clone(),
        metrics: metrics.clone(),
    };

    let fx_state = FxState {
        fx,
        metrics: metrics.clone(),
    };

    let health_state = HealthState {
        cache: cache.clone(),
        registry: registry.clone(),
        metrics: metrics.clone(),
    };

    // The governor config must outlive the router.
    let governor_conf = Box::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    // Build router
    let app = Router::new()
        // Public endpoints
        .route("/health", get(health_check))
        .with_state(health_state)
        .route("/stats", get(get_stats))
        .with_state(metrics.clone())
        .route("/ws/payments", get(websocket_handler))
        .with_state(metrics.clone())
        // Persistence-boundary rows
        .route("/api/wallets", post(create_wallet))
        .route("/api/destinations", post(create_destination))
        .with_state(store.clone())
        // FX quoting
        .route("/api/fx/source", post(quote_fixed_source))
        .route("/api/fx/target", post(quote_fixed_target))
        .with_state(fx_state)
        // Anchor callbacks (HMAC-verified before the handler runs)
        .route(
            "/api/webhooks/anchor",
            post(receive_webhook).layer(axum_middleware::from_fn({
                let verifier = verifier.clone();
                move |req, next| {
                    let verifier = verifier.clone();
                    async move { verify_webhook_signature(verifier, req, next).await }
                }
            })),
        )
        // Rates and payment lifecycle
        .route("/api/rates", post(get_rate))
        .route("/api/payments", post(create_payment))
        .route("/api/payments/:id", get(get_payment))
        .route(
            "/api/payments/:id/instructions",
            get(get_payment_instructions),
        )
        .route("/api/payments/:id/settle", post(settle_payment))
        .route("/api/payments/:id/confirm", post(confirm_payment))
        .with_state(app_state)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(Duration::from_secs(config.request_timeout_secs)),
        )
        .layer(GovernorLayer {
            config: Box::leak(governor_conf),
        })
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Payment stream: ws://{}/ws/payments", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn handle_timeout(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", err),
        )
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
