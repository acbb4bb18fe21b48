//! # Chain Backend
//!
//! Every read the SDK makes against the chain goes through the traits in this module.
//! `ChainBackend` implements them with ethers contract bindings; tests and offline tooling can
//! substitute their own implementation.
//!
//! - `LiquiditySampler`: the single call the curve fitter needs (`getAmountsOut`).
//! - `AggregatorBackend`: route helper, liquidity config, pool adapter and ERC-20 reads.

use crate::contracts::{Erc20, LiquidityConfig, PoolAdapter, RawPair, RouteHelper};
use crate::multicall::{Call, Multicall};
use crate::settings::ChainConfig;
use crate::types::pair::{Pair, PoolType, SwapType};
use crate::types::route::{OneHop, RawSingleRoute, RawSplitRoute, SplitPathInfo};
use anyhow::Result;
use async_trait::async_trait;
use ethers::abi::{decode, ParamType, Token};
use ethers::prelude::*;
use futures_util::future::try_join_all;
use log::debug;
use std::sync::Arc;

/// Per-pool quotes for a list of pools, index-aligned with the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidPrices {
    /// WAD price of token0 in token1
    pub prices: Vec<U256>,
    pub token0_balances: Vec<U256>,
    pub token1_balances: Vec<U256>,
}

#[async_trait]
pub trait LiquiditySampler: Send + Sync {
    /// Output amounts for each input in `amounts_in`, selling token0 when `is_token0`.
    async fn get_amounts_out(
        &self,
        pool: Address,
        pool_type: PoolType,
        is_token0: bool,
        amounts_in: &[U256],
        block: Option<BlockId>,
    ) -> Result<Vec<U256>>;
}

#[async_trait]
pub trait AggregatorBackend: LiquiditySampler {
    /// Pools trading `token0`/`token1`, filtered by a pool-type bitmap.
    async fn get_pools_with_flag(&self, token0: Address, token1: Address, flag: U256) -> Result<Vec<Pair>>;

    async fn get_mid_prices(&self, pools: &[Pair], is_buy: bool, block: Option<BlockId>) -> Result<MidPrices>;

    async fn get_pool_adapter(&self, pool_type: PoolType) -> Result<Address>;

    /// Batched `get_pool_adapter`; results are index-aligned with `pool_types`.
    async fn get_pool_adapters(&self, pool_types: &[PoolType]) -> Result<Vec<Address>> {
        let mut adapters = Vec::with_capacity(pool_types.len());
        for t in pool_types {
            adapters.push(self.get_pool_adapter(*t).await?);
        }
        Ok(adapters)
    }

    /// Best single path, or the best direct (one-hop) path when `direct` is set.
    async fn query_single_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        flag: U256,
        direct: bool,
    ) -> Result<RawSingleRoute>;

    async fn query_split_route(
        &self,
        from_token: Address,
        to_token: Address,
        mid_token: Address,
        amount: U256,
        flag: U256,
        is_direct: bool,
    ) -> Result<RawSplitRoute>;

    /// `(to_token, amount_out)` for selling `amount` of `from_token` into `pool`.
    async fn query_sell(
        &self,
        adapter: Address,
        from_token: Address,
        amount: U256,
        pool: Address,
    ) -> Result<(Address, U256)>;

    /// `(mid_price, token0_balance, token1_balance)` as seen by a pool adapter.
    async fn get_mid_price_and_balances(
        &self,
        adapter: Address,
        pool: Address,
        is_buy: bool,
    ) -> Result<(U256, U256, U256)>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;
}

pub fn pair_from_raw(raw: RawPair) -> Result<Pair> {
    let (token0, token1, pool_addr, pool_type, fee, swap_type) = raw;
    Ok(Pair {
        token0,
        token1,
        pool_addr,
        pool_type: PoolType::try_from(pool_type)?,
        fee,
        swap_type: SwapType::from(swap_type),
    })
}

fn pairs_from_raw(raw: Vec<RawPair>) -> Result<Vec<Pair>> {
    raw.into_iter().map(pair_from_raw).collect()
}

/// Ethers-backed implementation talking to the deployed helper contracts.
pub struct ChainBackend<M: Middleware> {
    provider: Arc<M>,
    route_helper: RouteHelper<M>,
    liquidity_config: LiquidityConfig<M>,
    multicall: Multicall<M>,
}

impl<M: Middleware + 'static> ChainBackend<M> {
    pub fn new(provider: Arc<M>, chain: &ChainConfig, multicall_batch_size: usize) -> Self {
        Self {
            route_helper: RouteHelper::new(chain.route_helper, provider.clone()),
            liquidity_config: LiquidityConfig::new(chain.liquidity_config, provider.clone()),
            multicall: Multicall::new(provider.clone(), chain.multicall, multicall_batch_size),
            provider,
        }
    }

    pub fn provider(&self) -> Arc<M> {
        self.provider.clone()
    }
}

#[async_trait]
impl<M: Middleware + 'static> LiquiditySampler for ChainBackend<M> {
    async fn get_amounts_out(
        &self,
        pool: Address,
        pool_type: PoolType,
        is_token0: bool,
        amounts_in: &[U256],
        block: Option<BlockId>,
    ) -> Result<Vec<U256>> {
        let mut call =
            self.liquidity_config
                .get_amounts_out(pool, pool_type.id(), is_token0, amounts_in.to_vec());
        if let Some(block) = block {
            call = call.block(block);
        }
        Ok(call.call().await?)
    }
}

#[async_trait]
impl<M: Middleware + 'static> AggregatorBackend for ChainBackend<M> {
    async fn get_pools_with_flag(&self, token0: Address, token1: Address, flag: U256) -> Result<Vec<Pair>> {
        let raw = self
            .liquidity_config
            .get_pools_with_flag(token0, token1, flag)
            .call()
            .await?;
        pairs_from_raw(raw)
    }

    async fn get_mid_prices(&self, pools: &[Pair], is_buy: bool, block: Option<BlockId>) -> Result<MidPrices> {
        let addresses = pools.iter().map(|p| p.pool_addr).collect();
        let types = pools.iter().map(|p| p.pool_type.id()).collect();
        let mut call = self.liquidity_config.get_mid_prices(addresses, types, is_buy);
        if let Some(block) = block {
            call = call.block(block);
        }
        let (prices, token0_balances, token1_balances) = call.call().await?;
        Ok(MidPrices {
            prices,
            token0_balances,
            token1_balances,
        })
    }

    async fn get_pool_adapter(&self, pool_type: PoolType) -> Result<Address> {
        Ok(self
            .liquidity_config
            .get_pool_adapter(pool_type.id())
            .call()
            .await?)
    }

    async fn get_pool_adapters(&self, pool_types: &[PoolType]) -> Result<Vec<Address>> {
        if self.multicall.address().is_zero() {
            return try_join_all(pool_types.iter().map(|t| self.get_pool_adapter(*t))).await;
        }

        let target = self.liquidity_config.address();
        let calls = pool_types
            .iter()
            .map(|t| {
                self.liquidity_config
                    .get_pool_adapter(t.id())
                    .calldata()
                    .map(|call_data| Call { target, call_data })
                    .ok_or_else(|| anyhow::anyhow!("Failed to encode getPoolAdapter({})", t))
            })
            .collect::<Result<Vec<_>>>()?;

        let results = self.multicall.run(calls, None).await?;
        debug!("Fetched {} pool adapters via multicall", results.len());
        results
            .iter()
            .map(|data| match decode(&[ParamType::Address], data)?.pop() {
                Some(Token::Address(adapter)) => Ok(adapter),
                _ => Err(anyhow::anyhow!("Invalid getPoolAdapter return data")),
            })
            .collect()
    }

    async fn query_single_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        flag: U256,
        direct: bool,
    ) -> Result<RawSingleRoute> {
        let call = if direct {
            self.route_helper.query_direct_route(from_token, to_token, amount, flag)
        } else {
            self.route_helper.query_single_route(from_token, to_token, amount, flag)
        };
        let ((best_amount, mid_price), best_path, pools) = call.call().await?;
        Ok(RawSingleRoute {
            best_amount,
            mid_price,
            best_path,
            best_pool_path: pairs_from_raw(pools)?,
        })
    }

    async fn query_split_route(
        &self,
        from_token: Address,
        to_token: Address,
        mid_token: Address,
        amount: U256,
        flag: U256,
        is_direct: bool,
    ) -> Result<RawSplitRoute> {
        let ((best_amount, mid_price), (tokens, hops, final_amount_out, is_valid)) = self
            .route_helper
            .query_split_route(from_token, to_token, mid_token, amount, flag, is_direct)
            .call()
            .await?;
        let one_hops = hops
            .into_iter()
            .map(|(pools, weights)| {
                Ok(OneHop {
                    pools: pairs_from_raw(pools)?,
                    weights,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RawSplitRoute {
            best_amount,
            mid_price,
            best_path_info: SplitPathInfo {
                tokens,
                one_hops,
                final_amount_out,
                is_valid,
            },
        })
    }

    async fn query_sell(
        &self,
        adapter: Address,
        from_token: Address,
        amount: U256,
        pool: Address,
    ) -> Result<(Address, U256)> {
        let adapter = PoolAdapter::new(adapter, self.provider.clone());
        Ok(adapter.query_sell(from_token, amount, pool).call().await?)
    }

    async fn get_mid_price_and_balances(
        &self,
        adapter: Address,
        pool: Address,
        is_buy: bool,
    ) -> Result<(U256, U256, U256)> {
        let adapter = PoolAdapter::new(adapter, self.provider.clone());
        Ok(adapter.get_mid_price_and_balances(pool, is_buy).call().await?)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let erc20 = Erc20::new(token, self.provider.clone());
        Ok(erc20.allowance(owner, spender).call().await?)
    }
}
