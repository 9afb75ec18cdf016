mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod notify;
mod profiles;
mod quota;
mod render;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::generation::generator::LlmContentGenerator;
use crate::generation::orchestrator::{GenerationOrchestrator, GenerationSettings};
use crate::generation::store::PgGenerationStore;
use crate::llm_client::LlmClient;
use crate::notify::LogNotifier;
use crate::profiles::PgProfileReader;
use crate::quota::lock::RedisUserLock;
use crate::quota::store::PgQuotaStore;
use crate::quota::QuotaLedger;
use crate::render::pdf::ChromePdfEngine;
use crate::render::photo::PhotoPolicy;
use crate::render::service::RenderService;
use crate::render::storage::S3ArtifactStore;
use crate::render::CvRenderer;
use crate::routes::build_router;
use crate::state::AppState;

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

    info!("Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (per-user generation lock)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let locks = Arc::new(RedisUserLock::new(redis, config.generation_lock_ttl));
    info!(
        "Redis generation lock initialized (ttl {}s)",
        config.generation_lock_ttl.as_secs()
    );

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let artifacts = Arc::new(S3ArtifactStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.generation_timeout);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let photos = PhotoPolicy::new(config.photo_origins.as_slice())?;
    info!("CV photos accepted from {}", config.photo_origins.join(", "));

    // Stores and services
    let quota = QuotaLedger::new(Arc::new(PgQuotaStore::new(db.clone())));
    let generations = Arc::new(PgGenerationStore::new(db.clone()));
    let profiles = Arc::new(PgProfileReader::new(db));
    let generator = Arc::new(LlmContentGenerator::new(llm));

    let orchestrator = GenerationOrchestrator::new(
        quota.clone(),
        locks,
        profiles.clone(),
        generator.clone(),
        generations.clone(),
        Arc::new(LogNotifier),
        GenerationSettings {
            timeout: config.generation_timeout,
            photos: photos.clone(),
        },
    );

    let pdf_engine = Arc::new(ChromePdfEngine::new(
        config.chrome_bin.clone(),
        config.render_timeout,
    ));
    let renderer = CvRenderer::new(pdf_engine, artifacts, photos)?;
    info!("Templates compiled; printing PDFs with {}", config.chrome_bin);
    let renders =
        RenderService::new(generations.clone(), profiles.clone(), quota.clone(), renderer);

    // Build app state
    let state = AppState {
        quota,
        generations,
        profiles,
        generator,
        orchestrator,
        renders,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "vitae-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
