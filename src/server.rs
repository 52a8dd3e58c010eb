//! # Server Module
//!
//! HTTP server setup and route configuration for the token_vesting server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue, routing::get};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::onchain_instance::instance::{AnchorTokenVesting, load_wallet};
use crate::routes::health::ping;
use crate::routes::token_vesting;
use crate::services::{Notifier, QueryCache, Toaster, TokenVestingProgramAccess};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub token_vesting: TokenVestingProgramAccess,
    /// Connected wallet; `None` renders the connect prompt
    pub wallet: Option<Arc<Keypair>>,
    pub toaster: Toaster,
}

/// Main app router with CORS for the configured frontend origins.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Router::new()
        .route("/ping", get(ping))
        .merge(token_vesting::create_routes())
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(origins)
                    .allow_methods([
                        axum::http::Method::GET,
                        axum::http::Method::POST,
                        axum::http::Method::OPTIONS,
                    ])
                    .allow_headers([
                        axum::http::header::ORIGIN,
                        axum::http::header::CONTENT_TYPE,
                        axum::http::header::ACCEPT,
                    ]),
            ),
        )
        .with_state(state)
}

/// Starts the token_vesting HTTP server.
///
/// Builds the program binding for the configured cluster, spawns the
/// notification consumer and serves until the process is terminated.
pub async fn start(config: Config) -> Result<()> {
    let wallet = match &config.wallet_keypair {
        Some(path) => {
            let keypair = load_wallet(path).context("Failed to load wallet keypair")?;
            tracing::info!("Wallet connected: {}", keypair.pubkey());
            Some(Arc::new(keypair))
        }
        None => {
            tracing::info!("No wallet configured; mutations are disabled");
            None
        }
    };

    // Reads still need a payer to build the client.
    let payer = wallet.clone().unwrap_or_else(|| Arc::new(Keypair::new()));
    let program = AnchorTokenVesting::new(&config.cluster, payer, config.commitment)
        .context("Failed to initialize token_vesting program instance")?;

    let (notifier, receiver) = Notifier::channel();
    let toaster = Toaster::new(config.cache.notification_history);
    toaster.spawn(receiver);

    let ttl = i64::try_from(config.cache.query_cache_ttl)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .context("QUERY_CACHE_TTL is out of range")?;

    let app_state = AppState {
        token_vesting: TokenVestingProgramAccess::new(
            Arc::new(program),
            config.cluster.clone(),
            QueryCache::new(ttl),
            notifier,
        ),
        wallet,
        toaster,
    };

    let app = build_router(app_state, &config.server.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid SERVER_HOST/SERVER_PORT")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address - port may already be in use")?;

    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!(
        "📊 token_vesting endpoints available at http://{}/api/v1/token_vesting",
        addr
    );
    tracing::info!("🌐 Cluster: {} ({})", config.cluster.name, config.cluster.network);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
