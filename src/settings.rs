use crate::curve_fitter::CurveOptions;
use config::{Config, ConfigError, File};
use ethers::types::Address;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Deployed helper contracts for one chain. A zero address means "not deployed here".
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ChainConfig {
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default)]
    pub route_helper: Address,
    #[serde(default)]
    pub liquidity_config: Address,
    /// Settlement contract receiving `mixSwap` / `multiSwap`
    #[serde(default)]
    pub aggregator: Address,
    /// Spender users approve before swapping ERC-20 input
    #[serde(default)]
    pub approve_target: Address,
    #[serde(default)]
    pub multicall: Address,
    #[serde(default)]
    pub wrapped_native: Address,
}

impl ChainConfig {
    pub fn unconfigured(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Self::default()
        }
    }

    pub fn supports_routes(&self) -> bool {
        !self.route_helper.is_zero()
    }

    pub fn supports_liquidity(&self) -> bool {
        !self.liquidity_config.is_zero()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Rpc {
    #[serde(default = "default_http_url")]
    pub http_url: String,
}

fn default_http_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

impl Default for Rpc {
    fn default() -> Self {
        Self {
            http_url: default_http_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SwapSettings {
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
    /// Added to the current time when a caller gives no deadline
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default)]
    pub broker: Address,
    #[serde(default)]
    pub broker_fee_bps: u64,
}

fn default_slippage_bps() -> u64 {
    50 // 0.5%
}
fn default_deadline_secs() -> u64 {
    1200 // 20 minutes
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            slippage_bps: default_slippage_bps(),
            deadline_secs: default_deadline_secs(),
            broker: Address::zero(),
            broker_fee_bps: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiquiditySettings {
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pools fitted at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_ratio() -> f64 {
    0.5
}
fn default_steps() -> usize {
    50
}
fn default_batch_size() -> usize {
    10
}
fn default_concurrency() -> usize {
    3
}

impl Default for LiquiditySettings {
    fn default() -> Self {
        Self {
            ratio: default_ratio(),
            steps: default_steps(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
        }
    }
}

impl LiquiditySettings {
    pub fn curve_options(&self) -> CurveOptions {
        CurveOptions {
            ratio: self.ratio,
            steps: self.steps,
            batch_size: self.batch_size,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MulticallSettings {
    #[serde(default = "default_multicall_batch_size")]
    pub batch_size: usize,
}

fn default_multicall_batch_size() -> usize {
    100
}

impl Default for MulticallSettings {
    fn default() -> Self {
        Self {
            batch_size: default_multicall_batch_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub rpc: Rpc,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Keyed by chain id
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
    #[serde(default)]
    pub swap: SwapSettings,
    #[serde(default)]
    pub liquidity: LiquiditySettings,
    #[serde(default)]
    pub multicall: MulticallSettings,
}

fn default_chain_id() -> u64 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc: Rpc::default(),
            chain_id: default_chain_id(),
            chains: HashMap::new(),
            swap: SwapSettings::default(),
            liquidity: LiquiditySettings::default(),
            multicall: MulticallSettings::default(),
        }
    }
}

impl Settings {
    /// `Config.toml` from the working directory (optional), then `SDK_*` environment overrides.
    pub fn new() -> Result<Self, ConfigError> {
        let mut settings = Self::from_path("Config.toml")?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Loads a single file; a missing file yields the defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .build()?;
        s.try_deserialize()
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("SDK_RPC_HTTP_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                self.rpc.http_url = trimmed.to_string();
            }
        }
        if let Ok(raw) = env::var("SDK_CHAIN_ID") {
            match raw.trim().parse() {
                Ok(id) => self.chain_id = id,
                Err(e) => warn!("Ignoring SDK_CHAIN_ID={}: {}", raw, e),
            }
        }
        if let Ok(raw) = env::var("SDK_SLIPPAGE_BPS") {
            match raw.trim().parse() {
                Ok(bps) => self.swap.slippage_bps = bps,
                Err(e) => warn!("Ignoring SDK_SLIPPAGE_BPS={}: {}", raw, e),
            }
        }
        if let Ok(raw) = env::var("SDK_BROKER") {
            if let Ok(addr) = raw.trim().parse() {
                self.swap.broker = addr;
            }
        }
    }

    /// Contracts for the selected chain. Unknown chains come back with every address zeroed,
    /// which route and liquidity queries treat as "no results".
    pub fn chain_config(&self) -> ChainConfig {
        match self.chains.get(&self.chain_id.to_string()) {
            Some(chain) => ChainConfig {
                chain_id: self.chain_id,
                ..chain.clone()
            },
            None => {
                warn!("No contracts configured for chain {}", self.chain_id);
                ChainConfig::unconfigured(self.chain_id)
            }
        }
    }
}
