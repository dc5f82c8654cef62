use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use hpo_search::config;
use hpo_search::search::HpoSearchEngine;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hpo_search=debug,hpo_search_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::init_config()
        .map_err(anyhow::Error::msg)?
        .read()
        .clone();
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    let engine = HpoSearchEngine::instance();
    tracing::info!("Term dictionary: {:?}", engine.source().terms_file);

    // Warm up in background; a failure is retried on first query / 后台预热索引
    tokio::spawn(async move {
        if let Err(e) = engine.initialize().await {
            tracing::error!("HPO index warm-up failed, will retry on first query: {}", e);
        }
    });

    let state = Arc::new(AppState {
        engine,
        config: app_config.clone(),
    });

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/status", get(api::server::get_engine_status))
        .route("/api/query", get(api::search::query))
        .route("/api/search", get(api::search::search))
        .route("/api/terms", post(api::search::get_terms))
        .route("/api/terms/:id", get(api::search::get_term))
        .route("/api/relevant", post(api::search::find_relevant_terms))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
