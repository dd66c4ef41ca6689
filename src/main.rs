//! Reseller Catalog - product catalog API

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use secrecy::ExposeSecret;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reseller_catalog::routes::{self, database::DatabaseState, sheets::SheetsState, AdminSecret, ADMIN_SECRET_HEADER};
use reseller_catalog::sheets::{GoogleSheetsSource, ServiceAccount};
use reseller_catalog::storage::SupabaseStorage;
use reseller_catalog::{store, Backend, Config, ProductCache};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "reseller_catalog=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let admin_secret = AdminSecret::new(config.admin_secret.clone());
    let (api, methods) = match &config.backend {
        Backend::Sheets(sheets) => {
            let account = ServiceAccount::new(sheets.service_account_email.clone(), sheets.private_key.expose_secret());
            let source = GoogleSheetsSource::new(account, sheets.sheet_id.clone());
            let cache = Arc::new(ProductCache::new(Arc::new(source), sheets.cache_ttl));
            tracing::info!(ttl_secs = cache.ttl().as_secs(), "Using Google Sheets catalog");
            (routes::sheets::router(SheetsState { cache, admin_secret }), vec![Method::GET, Method::POST])
        }
        Backend::Database(db) => {
            let pool = store::connect(db.database_url.expose_secret()).await?;
            let images = SupabaseStorage::new(&db.supabase_url, db.bucket.clone(), db.supabase_key.clone());
            tracing::info!(bucket = %db.bucket, "Using PostgreSQL catalog");
            let state = DatabaseState { db: pool, images: Arc::new(images), admin_secret };
            (routes::database::router(state), vec![Method::GET, Method::POST, Method::PUT, Method::DELETE])
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods(methods)
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ADMIN_SECRET_HEADER)]);

    let app = Router::new()
        .route("/health", get(routes::health))
        .merge(api)
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.socket_addr();
    tracing::info!("Reseller catalog listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
