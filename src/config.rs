use std::{fs, path::Path};

use anyhow::Context;
use dotenv::dotenv;
use envsubst::substitute;
use serde::Deserialize;

const ENV_PREFIXES: [&str; 4] = ["SERVER_", "WALLET_", "RPC_", "CHAIN_"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    pub chain: ChainSettings,
    #[serde(default)]
    pub routing: RoutingSettings,
    #[serde(default)]
    pub mutations: MutationSettings,
}

impl Config {
    pub async fn from_yaml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenv().ok();

        let path = path.as_ref();
        let file_content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file from path: {}", path.display()))?;

        let env_vars: std::collections::HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| ENV_PREFIXES.iter().any(|prefix| key.starts_with(prefix)))
            .collect();

        let interpolated = substitute(&file_content, &env_vars)
            .context("Failed to substitute environment variables in YAML")?;

        let config: Config =
            serde_yaml::from_str(&interpolated).context("Failed to parse YAML configuration")?;

        Ok(config)
    }

    pub fn server_uri(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub private_key: String,
}

/// Contract addresses of the exchange deployment to talk to.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    pub chain_id: u64,
    pub factory_address: String,
    pub router_address: String,
    #[serde(default)]
    pub faucet_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingSettings {
    /// Per-hop fee used for route estimates, as a fraction (0.003 = 0.3%).
    #[serde(default = "default_swap_fee")]
    pub swap_fee: f64,
    /// Bridge token whitelist, in priority order.
    #[serde(default)]
    pub bridge_tokens: Vec<TokenSettings>,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            swap_fee: default_swap_fee(),
            bridge_tokens: Vec::new(),
        }
    }
}

fn default_swap_fee() -> f64 {
    0.003
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSettings {
    #[serde(default)]
    pub symbol: Option<String>,
    pub address: String,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationSettings {
    /// Return failed transactions to the caller instead of logging them.
    #[serde(default)]
    pub propagate_errors: bool,
}
