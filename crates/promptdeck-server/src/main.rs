//! Promptdeck HTTP API Server
//!
//! REST endpoints for template lifecycle, fork/favorite relationships,
//! search and usage analytics in the promptdeck marketplace.

use axum::{Router, response::Json, routing::get};
use promptdeck_engine::{Engine, MemoryIndex, MemoryStore};
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod auth;
mod config;
mod error;
mod models;
mod routes;

use config::ServerConfig;
use error::Result;

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config: ServerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "promptdeck_server=debug,tower_http=debug".to_string()),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    info!(
        "Starting Promptdeck Server on {}:{}",
        config.host, config.port
    );

    // In-memory collaborators; durable deployments wire their own
    // DocumentStore and SearchIndex backends here.
    let store = Arc::new(MemoryStore::new());
    let index = Arc::new(MemoryIndex::new());
    let engine = Engine::new(store, index)
        .with_search_limits(config.default_search_limit, config.max_search_limit);

    // Create application state
    let state = AppState {
        engine: Arc::new(engine),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Boundary routes
        .nest("/templates", routes::templates::router())
        .merge(routes::search::router())
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Health check endpoint
async fn health_check() -> Result<Json<Value>> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "promptdeck-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": time::OffsetDateTime::now_utc().to_string()
    })))
}
