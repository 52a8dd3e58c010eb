//! # token_vesting Server
//!
//! HTTP front-end for the token_vesting Anchor program on Solana, built with
//! Axum and Tokio.
//!
//! ## Features
//! - Program binding generated from the program IDL (`idls/token_vesting.json`)
//! - Cached queries with per-mutation invalidation
//! - Transaction and error notifications decoupled from the RPC calls
//! - Structured logging with tracing
//!
//! ## Architecture
//! The server is organized into modules:
//! - `onchain_instance`: cluster selection and the program binding
//! - `services`: query cache, data access and notifications
//! - `routes`: HTTP route handlers
//!   - `health`: Health check endpoint
//!   - `token_vesting`: feature view, queries and mutations
//! - `config`: Environment variable configuration management
//!
//! ## Environment Setup
//! Set `SOLANA_RPC_URL`, `CLUSTER_NETWORK` and `WALLET_KEYPAIR` (optionally in
//! a `.env` file). Without a wallet the server only serves queries.
//!
//! ## Running the Server
//! ```bash
//! cargo run
//! ```

mod config;
mod error;
mod onchain_instance;
mod routes;
mod server;
mod services;
mod state_structs;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting token_vesting server...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = config::Config::from_env()?;
    server::start(config).await
}
