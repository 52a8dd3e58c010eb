//! Cluster selection: which network endpoint the binding talks to and how
//! explorer links are built for it.

use std::{convert::Infallible, fmt, str::FromStr};

use anchor_client::Cluster;
use url::{Url, form_urlencoded};

const EXPLORER_BASE_URL: &str = "https://explorer.solana.com";

/// Network environment a cluster belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterNetwork {
    Mainnet,
    Testnet,
    Devnet,
    Custom,
}

impl ClusterNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterNetwork::Mainnet => "mainnet-beta",
            ClusterNetwork::Testnet => "testnet",
            ClusterNetwork::Devnet => "devnet",
            ClusterNetwork::Custom => "custom",
        }
    }
}

impl FromStr for ClusterNetwork {
    type Err = Infallible;

    /// Identifiers match exactly; anything else, `Devnet` included, is `Custom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mainnet-beta" => ClusterNetwork::Mainnet,
            "testnet" => ClusterNetwork::Testnet,
            "devnet" => ClusterNetwork::Devnet,
            _ => ClusterNetwork::Custom,
        })
    }
}

impl fmt::Display for ClusterNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An RPC endpoint plus the network it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub name: String,
    pub endpoint: String,
    pub ws_endpoint: String,
    pub network: ClusterNetwork,
}

impl ClusterConfig {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        network: ClusterNetwork,
    ) -> Self {
        let endpoint = endpoint.into();
        let ws_endpoint = derive_ws_url(&endpoint);
        Self {
            name: name.into(),
            endpoint,
            ws_endpoint,
            network,
        }
    }

    pub fn with_ws_endpoint(mut self, ws_endpoint: impl Into<String>) -> Self {
        self.ws_endpoint = ws_endpoint.into();
        self
    }

    pub fn devnet() -> Self {
        Self::new("devnet", "https://api.devnet.solana.com", ClusterNetwork::Devnet)
    }

    pub fn localnet() -> Self {
        Self::new("local", "http://localhost:8899", ClusterNetwork::Custom)
    }

    pub fn anchor_cluster(&self) -> Cluster {
        Cluster::Custom(self.endpoint.clone(), self.ws_endpoint.clone())
    }

    /// Explorer link for `path` (e.g. `account/<address>` or `tx/<signature>`).
    pub fn explorer_url(&self, path: &str) -> String {
        let param = match self.network {
            ClusterNetwork::Mainnet => String::new(),
            ClusterNetwork::Devnet => "?cluster=devnet".to_string(),
            ClusterNetwork::Testnet => "?cluster=testnet".to_string(),
            ClusterNetwork::Custom => {
                let encoded: String =
                    form_urlencoded::byte_serialize(self.endpoint.as_bytes()).collect();
                format!("?cluster=custom&customUrl={}", encoded)
            }
        };
        format!("{}/{}{}", EXPLORER_BASE_URL, path.trim_start_matches('/'), param)
    }
}

/// Websocket endpoint matching an RPC endpoint. A local validator serves
/// pubsub on the RPC port + 1.
pub fn derive_ws_url(endpoint: &str) -> String {
    let Ok(mut url) = Url::parse(endpoint) else {
        return endpoint.to_string();
    };
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return endpoint.to_string(),
    };
    if url.set_scheme(scheme).is_err() {
        return endpoint.to_string();
    }
    if let Some(port) = url.port() {
        let _ = url.set_port(Some(port.saturating_add(1)));
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert_eq!("devnet".parse::<ClusterNetwork>().unwrap(), ClusterNetwork::Devnet);
        assert_eq!("testnet".parse::<ClusterNetwork>().unwrap(), ClusterNetwork::Testnet);
        assert_eq!(
            "mainnet-beta".parse::<ClusterNetwork>().unwrap(),
            ClusterNetwork::Mainnet
        );
        assert_eq!("localnet".parse::<ClusterNetwork>().unwrap(), ClusterNetwork::Custom);
        assert_eq!("Devnet".parse::<ClusterNetwork>().unwrap(), ClusterNetwork::Custom);
        assert_eq!("mainnet".parse::<ClusterNetwork>().unwrap(), ClusterNetwork::Custom);
        assert_eq!(" devnet".parse::<ClusterNetwork>().unwrap(), ClusterNetwork::Custom);
        assert_eq!(ClusterNetwork::Mainnet.to_string(), "mainnet-beta");
    }

    #[test]
    fn test_ws_url_derivation() {
        assert_eq!(
            derive_ws_url("https://api.devnet.solana.com"),
            "wss://api.devnet.solana.com/"
        );
        assert_eq!(derive_ws_url("http://localhost:8899"), "ws://localhost:8900/");
        assert_eq!(derive_ws_url("not a url"), "not a url");
    }

    #[test]
    fn test_explorer_urls() {
        let devnet = ClusterConfig::devnet();
        assert_eq!(
            devnet.explorer_url("tx/abc"),
            "https://explorer.solana.com/tx/abc?cluster=devnet"
        );

        let mainnet = ClusterConfig::new(
            "mainnet-beta",
            "https://api.mainnet-beta.solana.com",
            ClusterNetwork::Mainnet,
        );
        assert_eq!(
            mainnet.explorer_url("account/xyz"),
            "https://explorer.solana.com/account/xyz"
        );

        let local = ClusterConfig::localnet();
        let expected = concat!(
            "https://explorer.solana.com/account/xyz",
            "?cluster=custom&customUrl=http%3A%2F%2Flocalhost%3A8899"
        );
        assert_eq!(local.explorer_url("/account/xyz"), expected);
    }
}
