mod auth;
mod config;
mod db;
mod embedding;
mod errors;
mod matching;
mod models;
mod profiles;
mod recommendations;
mod routes;
mod search;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::RedisRevocationList;
use crate::config::Config;
use crate::db::create_pool;
use crate::embedding::{EmbeddingProvider, HttpEmbeddingClient};
use crate::routes::build_router;
use crate::search::PgVectorSearch;
use crate::state::AppState;
use crate::store::postgres::PgDocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (document store + pgvector search share the pool)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (token revocation list)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize embedding provider
    let embeddings =
        HttpEmbeddingClient::new(config.embedding_base_url.clone(), config.embedding_model.clone());
    info!("Embedding client initialized (model: {})", embeddings.model());

    let state = AppState {
        store: Arc::new(PgDocumentStore::new(db.clone())),
        embeddings: Arc::new(embeddings),
        search: Arc::new(PgVectorSearch::new(db, config.embedding_model.clone())),
        revocations: Arc::new(RedisRevocationList::new(
            redis,
            Duration::from_secs(config.token_revocation_ttl_secs),
        )),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the web client domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
