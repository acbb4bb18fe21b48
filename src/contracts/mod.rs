// Contracts Module - read-only bindings plus the aggregator's swap entry points

pub mod aggregator;
pub mod erc20;
pub mod liquidity_config;
pub mod pool_adapter;
pub mod route_helper;

pub use erc20::Erc20;
pub use liquidity_config::LiquidityConfig;
pub use pool_adapter::PoolAdapter;
pub use route_helper::RouteHelper;

use ethers::types::Address;

/// `(token0, token1, poolAddr, poolType, fee, swapType)` as the contracts return a pair
pub type RawPair = (Address, Address, Address, u8, u32, u8);
