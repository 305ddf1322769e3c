//! Boardwalk Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardwalk_engine::api::websocket::{ws_handler, WsState};
use boardwalk_engine::api::ConnectionManager;
use boardwalk_engine::app::App;
use boardwalk_engine::bus::EventBus;
use boardwalk_engine::config::EngineConfig;
use boardwalk_engine::infrastructure::{BoardCatalog, SqliteSessionRepo};
use boardwalk_engine::rules::{register_rules, Notifier};
use boardwalk_engine::store::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boardwalk_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Boardwalk Engine");

    let config = EngineConfig::from_env();

    let catalog = match &config.board_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading board catalog");
            BoardCatalog::from_json_file(path)?
        }
        None => BoardCatalog::default_board(),
    };

    let sessions = Arc::new(SqliteSessionRepo::new(&config.session_db).await?);
    let store = Arc::new(SessionStore::new(
        catalog.into_spaces(),
        config.starting_balance,
    ));
    let bus = Arc::new(EventBus::new(Arc::clone(&store), config.sweep_timeout));
    let connections = Arc::new(ConnectionManager::new());

    let notifier: Arc<dyn Notifier> = Arc::clone(&connections) as Arc<dyn Notifier>;
    register_rules(&bus, notifier).await;

    let app = Arc::new(App::new(store, bus, sessions));
    let ws_state = Arc::new(WsState { app, connections });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ws_state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
