//! Configuration module for environment variables and application settings

use std::env;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use solana_sdk::commitment_config::CommitmentConfig;

use crate::onchain_instance::cluster::{ClusterConfig, ClusterNetwork};

#[derive(Debug, Clone)]
pub struct Config {
    /// Cluster every query and mutation runs against
    pub cluster: ClusterConfig,

    /// Path to the wallet keypair; `None` means no wallet is connected
    pub wallet_keypair: Option<String>,

    /// Commitment used for reads and confirmations
    pub commitment: CommitmentConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Query cache and notification settings
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Seconds a cached query is served before it is refetched
    pub query_cache_ttl: u64,
    /// Number of notifications kept for the API
    pub notification_history: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let network = var("CLUSTER_NETWORK")
            .map(|n| ClusterNetwork::from_str(&n).unwrap_or(ClusterNetwork::Custom))
            .unwrap_or(ClusterNetwork::Devnet);
        let mut cluster = match var("SOLANA_RPC_URL") {
            Some(endpoint) => ClusterConfig::new(network.as_str(), endpoint, network),
            None => match network {
                ClusterNetwork::Devnet => ClusterConfig::devnet(),
                ClusterNetwork::Custom => ClusterConfig::localnet(),
                public => ClusterConfig::new(
                    public.as_str(),
                    format!("https://api.{}.solana.com", public.as_str()),
                    public,
                ),
            },
        };
        if let Some(name) = var("CLUSTER_NAME") {
            cluster.name = name;
        }
        if let Some(ws) = var("SOLANA_WS_URL") {
            cluster = cluster.with_ws_endpoint(ws);
        }

        let commitment = match var("COMMITMENT").as_deref() {
            None | Some("confirmed") => CommitmentConfig::confirmed(),
            Some("processed") => CommitmentConfig::processed(),
            Some("finalized") => CommitmentConfig::finalized(),
            Some(other) => {
                return Err(anyhow!(
                    "COMMITMENT must be processed, confirmed or finalized, got {}",
                    other
                ));
            }
        };

        let port = var("SERVER_PORT")
            .or_else(|| var("PORT"))
            .map(|p| p.parse::<u16>().map_err(|_| anyhow!("invalid port: {}", p)))
            .transpose()?
            .unwrap_or(3000);

        Ok(Self {
            cluster,
            wallet_keypair: var("WALLET_KEYPAIR"),
            commitment,
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                cors_origins: var("CORS_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:3001".to_string())
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
            },
            cache: CacheConfig {
                query_cache_ttl: parse_or(&var, "QUERY_CACHE_TTL", 30)?,
                notification_history: parse_or(&var, "NOTIFICATION_HISTORY", 20)?,
            },
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} has an invalid value: {}", key, value)),
        None => Ok(default),
    }
}
