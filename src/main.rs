use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use meetbook::config::AppConfig;
use meetbook::db;
use meetbook::handlers;
use meetbook::services::calendar;
use meetbook::services::proposal::ProposalService;
use meetbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    tracing::info!(
        demo_mode = config.demo_mode,
        timezone = config.timezone.name(),
        slot_spacing = ?config.slot_spacing,
        anchor_rounding = ?config.anchor_rounding,
        "loaded configuration"
    );

    let repository = db::from_url(config.database_url.as_deref())?;

    let state = Arc::new(AppState {
        proposals: ProposalService::from_config(&config),
        calendar: calendar::from_config(&config),
        repository,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/propose", post(handlers::propose::propose))
        .route("/confirm", post(handlers::confirm::confirm))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
