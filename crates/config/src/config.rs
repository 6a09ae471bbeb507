//! Core configuration structures for the median-relay oracle price relayer

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ethereum account used to sign submissions
    pub ethereum: EthereumConfig,

    /// Peer-to-peer transport configuration
    pub p2p: P2pConfig,

    /// Local RPC agent configuration
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Relay loop configuration
    #[serde(default)]
    pub relayer: RelayerConfig,

    /// Feeder allowlist: hex addresses whose events the transport accepts
    #[serde(default)]
    pub feeds: Vec<String>,

    /// Relayed asset pairs
    #[serde(default)]
    pub pairs: Vec<PairConfig>,
}

/// Ethereum account configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EthereumConfig {
    /// Address of the submitting account, hex
    pub from: String,

    /// Path to the keystore directory
    pub keystore: String,

    /// Path to the keystore passphrase file
    pub password: String,
}

/// Peer-to-peer transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct P2pConfig {
    /// Multiaddrs the node listens on
    #[serde(default)]
    pub listen_addrs: Vec<String>,

    /// Multiaddrs of bootstrap peers
    #[serde(default)]
    pub bootstrap_addrs: Vec<String>,

    /// Multiaddrs that are never dialed or accepted
    #[serde(default)]
    pub blocked_addrs: Vec<String>,
}

/// Local RPC agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Listen address of the control socket
    #[serde(default = "default_rpc_address")]
    pub address: String,
}

/// Relay loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayerConfig {
    /// Seconds between relay attempts
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

/// Per-pair relaying parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    /// Asset pair identifier, e.g. "ETHUSD"
    pub asset_pair: String,

    /// Minimum spread, in percent, below which an update is sent
    pub oracle_spread: f64,

    /// Seconds after which the on-chain price counts as expired
    #[serde(default = "default_oracle_expiration_secs")]
    pub oracle_expiration_secs: u64,

    /// Seconds after which a buffered feeder price is discarded
    #[serde(default = "default_price_expiration_secs")]
    pub price_expiration_secs: u64,

    /// Address of the pair's median oracle contract, hex
    pub median_address: String,
}

impl RelayerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl PairConfig {
    pub fn observation_ttl(&self) -> Duration {
        Duration::from_secs(self.price_expiration_secs)
    }

    pub fn oracle_freshness_ttl(&self) -> Duration {
        Duration::from_secs(self.oracle_expiration_secs)
    }
}

// Default value functions
fn default_rpc_address() -> String {
    "127.0.0.1:9989".to_string()
}

fn default_interval_secs() -> u64 {
    60
}

fn default_oracle_expiration_secs() -> u64 {
    3600 // 1 hour
}

fn default_price_expiration_secs() -> u64 {
    300 // 5 minutes
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            address: default_rpc_address(),
        }
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}
