mod config;
mod db;
mod model;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use config::{AppConfig, StorageBackend};
use store::{MemoryStore, PgStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let state = match config.storage.clone() {
        StorageBackend::Postgres { database_url, max_connections } => {
            let pool = db::init_pool(&database_url, max_connections)
                .await
                .expect("database init failed");
            state::AppState::new(Arc::new(PgStore::new(pool)), config)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            state::AppState::new(Arc::new(MemoryStore::new()), config)
        }
    };

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "freeboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
