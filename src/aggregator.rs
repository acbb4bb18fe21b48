//! # Aggregator Facade
//!
//! Entry point for route queries, liquidity analysis and payload construction on one chain.
//!
//! ## Overview
//!
//! - Route queries go to the on-chain route helper and come back normalized.
//! - Pool adapters are looked up once per pool type and cached for the facade's lifetime.
//! - Payload encoding only needs the route and the cached adapters; it never signs or sends.
//!
//! ## Example
//!
//! ```rust,ignore
//! let settings = Settings::new()?;
//! let chain = settings.chain_config();
//! let backend = Arc::new(ChainBackend::new(provider, &chain, settings.multicall.batch_size));
//! let aggregator = Aggregator::new(backend, &settings);
//! aggregator.init().await?;
//!
//! let route = aggregator.query_single_route(usdc, weth, amount, &[]).await?;
//! let tx = aggregator.encode_mix_swap_data(&route, usdc, weth, amount, EncodeOptions::default()).await?;
//! ```

use crate::backend::AggregatorBackend;
use crate::curve_fitter::{fit_pool_curves, CurveOptions, PairDecimals};
use crate::encoder::{
    self, build_mix_swap_param, build_multi_swap_param, encode_mix_swap, encode_multi_swap,
    query_token, SwapContext, UnsignedSwapTx,
};
use crate::error::AggregatorError;
use crate::flags::{get_dex_flag, get_split_dex_flag};
use crate::liquidity::{
    adjust_liquidity_results, compute_liquidity, mid_price_from_quotes, target_prices,
    PoolLiquidityReport,
};
use crate::metrics;
use crate::normalization::{from_base_units, wad_to_f64};
use crate::router::{build_one_pool_route, normalize_single_route, normalize_split_route};
use crate::settings::{ChainConfig, LiquiditySettings, Settings, SwapSettings};
use crate::types::conversions::{is_native, sort_tokens};
use crate::types::pair::{Pair, PoolType, SwapType};
use crate::types::route::{SingleRouteResult, SplitRouteResult};
use anyhow::Result;
use dashmap::DashMap;
use ethers::abi::Token;
use ethers::types::{Address, BlockId, U256};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Pool type whose adapter quotes one-pool routes when the caller names none.
const DEFAULT_ONE_POOL_TYPE: PoolType = PoolType::Oyster;

/// Per-call overrides for payload encoding; unset fields fall back to settings.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    pub slippage_bps: Option<u64>,
    /// Unix seconds
    pub deadline: Option<u64>,
    pub broker: Option<Address>,
    pub broker_fee_bps: Option<u64>,
}

/// Knobs for `get_pool_liquidity`.
#[derive(Debug, Clone)]
pub struct LiquidityOptions {
    pub curve: CurveOptions,
    /// Pools fitted at the same time
    pub concurrency: usize,
    pub block: Option<BlockId>,
}

impl Default for LiquidityOptions {
    fn default() -> Self {
        Self::from(&LiquiditySettings::default())
    }
}

impl From<&LiquiditySettings> for LiquidityOptions {
    fn from(settings: &LiquiditySettings) -> Self {
        Self {
            curve: settings.curve_options(),
            concurrency: settings.concurrency,
            block: None,
        }
    }
}

pub struct Aggregator<B: AggregatorBackend> {
    backend: Arc<B>,
    chain: ChainConfig,
    swap: SwapSettings,
    liquidity: LiquiditySettings,
    adapter_cache: DashMap<PoolType, Address>,
}

impl<B: AggregatorBackend> Aggregator<B> {
    pub fn new(backend: Arc<B>, settings: &Settings) -> Self {
        Self::with_chain(backend, settings.chain_config(), settings)
    }

    pub fn with_chain(backend: Arc<B>, chain: ChainConfig, settings: &Settings) -> Self {
        Self {
            backend,
            chain,
            swap: settings.swap.clone(),
            liquidity: settings.liquidity.clone(),
            adapter_cache: DashMap::new(),
        }
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn wrapped(&self, token: Address) -> Address {
        query_token(token, self.chain.wrapped_native)
    }

    /// Pre-warms the adapter cache for every known pool type.
    #[tracing::instrument(skip(self))]
    pub async fn init(&self) -> Result<()> {
        if !self.chain.supports_liquidity() {
            warn!(
                "Chain {} has no liquidity config, skipping adapter pre-warm",
                self.chain.chain_id
            );
            return Ok(());
        }
        let adapters = self.backend.get_pool_adapters(&PoolType::ALL).await?;
        for (pool_type, adapter) in PoolType::ALL.iter().zip(adapters) {
            if adapter.is_zero() {
                debug!("No adapter registered for {}", pool_type);
                continue;
            }
            self.adapter_cache.insert(*pool_type, adapter);
        }
        info!(
            "Adapter cache warmed with {} entries on chain {}",
            self.adapter_cache.len(),
            self.chain.chain_id
        );
        Ok(())
    }

    /// Adapter registered for `pool_type`, cached after the first successful lookup.
    pub async fn pool_adapter(&self, pool_type: PoolType) -> Result<Address> {
        if let Some(adapter) = self.adapter_cache.get(&pool_type) {
            metrics::increment_cache_hit("pool_adapter");
            return Ok(*adapter);
        }
        metrics::increment_cache_miss("pool_adapter");

        let adapter = self.backend.get_pool_adapter(pool_type).await?;
        if adapter.is_zero() {
            return Err(AggregatorError::AdapterNotFound(pool_type).into());
        }
        self.adapter_cache.insert(pool_type, adapter);
        Ok(adapter)
    }

    pub fn cached_adapter(&self, pool_type: PoolType) -> Option<Address> {
        self.adapter_cache.get(&pool_type).map(|a| *a)
    }

    /// Pools trading the pair, skipping the pool types in `exclude_types`.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn get_pool_list(
        &self,
        token_a: Address,
        token_b: Address,
        exclude_types: &[PoolType],
    ) -> Result<Vec<Pair>> {
        if !self.chain.supports_liquidity() {
            return Ok(Vec::new());
        }
        let (token0, token1) = sort_tokens(self.wrapped(token_a), self.wrapped(token_b));
        self.backend
            .get_pools_with_flag(token0, token1, get_dex_flag(exclude_types))
            .await
    }

    async fn single_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        exclude_types: &[PoolType],
        direct: bool,
    ) -> Result<SingleRouteResult> {
        metrics::increment_route_query(if direct { "direct" } else { "single" });
        if !self.chain.supports_routes() {
            warn!("Chain {} has no route helper", self.chain.chain_id);
            return Ok(SingleRouteResult::default());
        }
        let raw = self
            .backend
            .query_single_route(
                self.wrapped(from_token),
                self.wrapped(to_token),
                amount,
                get_dex_flag(exclude_types),
                direct,
            )
            .await?;
        Ok(normalize_single_route(raw))
    }

    /// Best one-hop route.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn query_direct_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        exclude_types: &[PoolType],
    ) -> Result<SingleRouteResult> {
        self.single_route(from_token, to_token, amount, exclude_types, true)
            .await
    }

    /// Best multi-hop route through one pool per hop.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn query_single_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        exclude_types: &[PoolType],
    ) -> Result<SingleRouteResult> {
        self.single_route(from_token, to_token, amount, exclude_types, false)
            .await
    }

    /// Best route with each hop split across pools. Zero-weight slots are removed.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn query_split_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        is_direct: bool,
        exclude_types: &[PoolType],
        split_count: Option<u32>,
        middle_token: Option<Address>,
    ) -> Result<SplitRouteResult> {
        metrics::increment_route_query("split");
        if !self.chain.supports_routes() {
            warn!("Chain {} has no route helper", self.chain.chain_id);
            return Ok(SplitRouteResult::default());
        }
        let mid_token = middle_token.map(|t| self.wrapped(t)).unwrap_or_default();
        let raw = self
            .backend
            .query_split_route(
                self.wrapped(from_token),
                self.wrapped(to_token),
                mid_token,
                amount,
                get_split_dex_flag(exclude_types, split_count),
                is_direct,
            )
            .await?;
        Ok(normalize_split_route(raw))
    }

    /// Quotes a single named pool through its adapter and wraps it as a one-hop split route.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn query_one_pool_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        pool: Address,
        adapter: Option<Address>,
    ) -> Result<SplitRouteResult> {
        metrics::increment_route_query("one_pool");
        let adapter = match adapter {
            Some(adapter) => adapter,
            None if !self.chain.supports_liquidity() => {
                warn!("Chain {} has no liquidity config", self.chain.chain_id);
                return Ok(SplitRouteResult::default());
            }
            None => self.pool_adapter(DEFAULT_ONE_POOL_TYPE).await?,
        };
        let from = self.wrapped(from_token);
        let to = self.wrapped(to_token);
        let is_buy = from < to;

        let (quote, prices) = tokio::try_join!(
            self.backend.query_sell(adapter, from, amount, pool),
            self.backend.get_mid_price_and_balances(adapter, pool, is_buy),
        )?;
        let (out_token, amount_out) = quote;
        if out_token != to {
            warn!(
                "Pool {:?} quoted {:?} instead of {:?}",
                pool, out_token, to
            );
        }
        Ok(build_one_pool_route(
            from,
            to,
            pool,
            DEFAULT_ONE_POOL_TYPE,
            SwapType::Adapter,
            amount_out,
            prices.0,
        ))
    }

    /// Depth per pool at mid-relative price offsets, both sides of the book.
    ///
    /// Each pool is sampled with `getAmountsOut`, fitted with a spline per direction, and the
    /// curves are read at `mid × (1 ± m)` for every multiplier `m`. Amounts are human units.
    #[tracing::instrument(skip(self, pools, options), fields(pools = pools.len()))]
    pub async fn get_pool_liquidity(
        &self,
        pools: &[Pair],
        decimals: PairDecimals,
        multipliers: &[f64],
        options: LiquidityOptions,
    ) -> Result<PoolLiquidityReport> {
        if pools.is_empty() || !self.chain.supports_liquidity() {
            return Ok(PoolLiquidityReport::default());
        }

        let (buy, sell) = tokio::try_join!(
            self.backend.get_mid_prices(pools, true, options.block),
            self.backend.get_mid_prices(pools, false, options.block),
        )?;
        for (what, len) in [
            ("buy prices", buy.prices.len()),
            ("sell prices", sell.prices.len()),
            ("token0 balances", sell.token0_balances.len()),
            ("token1 balances", sell.token1_balances.len()),
        ] {
            if len != pools.len() {
                return Err(AggregatorError::LengthMismatch {
                    what,
                    expected: pools.len(),
                    actual: len,
                }
                .into());
            }
        }

        let buy_prices: Vec<f64> = buy.prices.iter().map(|p| wad_to_f64(*p)).collect();
        let sell_prices: Vec<f64> = sell.prices.iter().map(|p| wad_to_f64(*p)).collect();
        let mid_price = mid_price_from_quotes(&buy_prices, &sell_prices);

        let backend = self.backend.as_ref();
        let curve_options = options.curve;
        let block = options.block;
        let curves: HashMap<Address, _> = stream::iter(pools.iter().enumerate())
            .map(|(i, pool)| {
                let balance0 = from_base_units(sell.token0_balances[i], decimals.token0);
                let balance1 = from_base_units(sell.token1_balances[i], decimals.token1);
                async move {
                    let fitted = fit_pool_curves(
                        backend,
                        pool,
                        balance0,
                        balance1,
                        decimals,
                        &curve_options,
                        block,
                    )
                    .await;
                    metrics::increment_curve_fit(if fitted.is_ok() { "ok" } else { "error" });
                    fitted.map(|c| (pool.pool_addr, c))
                }
            })
            .buffered(options.concurrency.max(1))
            .try_collect()
            .await?;

        let addresses: Vec<Address> = pools.iter().map(|p| p.pool_addr).collect();
        let buy_targets = target_prices(mid_price, multipliers, true);
        let sell_targets = target_prices(mid_price, multipliers, false);
        let buy_liquidity_results =
            adjust_liquidity_results(&compute_liquidity(&addresses, &curves, &buy_targets, true), true);
        let sell_liquidity_results = adjust_liquidity_results(
            &compute_liquidity(&addresses, &curves, &sell_targets, false),
            false,
        );

        Ok(PoolLiquidityReport {
            mid_price,
            buy_liquidity_results,
            sell_liquidity_results,
        })
    }

    fn swap_context(
        &self,
        from_token: Address,
        to_token: Address,
        from_amount: U256,
        options: &EncodeOptions,
    ) -> Result<SwapContext> {
        if self.chain.aggregator.is_zero() {
            return Err(AggregatorError::UnsupportedChain(self.chain.chain_id).into());
        }
        let deadline = options.deadline.unwrap_or_else(|| {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            now + self.swap.deadline_secs
        });
        Ok(SwapContext {
            from_token,
            to_token,
            from_amount,
            slippage_bps: options.slippage_bps.unwrap_or(self.swap.slippage_bps),
            deadline,
            broker: options.broker.unwrap_or(self.swap.broker),
            broker_fee_bps: options.broker_fee_bps.unwrap_or(self.swap.broker_fee_bps),
            aggregator: self.chain.aggregator,
        })
    }

    /// `mixSwap` transaction for a single route.
    #[tracing::instrument(skip(self, route), level = "debug")]
    pub async fn encode_mix_swap_data(
        &self,
        route: &SingleRouteResult,
        from_token: Address,
        to_token: Address,
        from_amount: U256,
        options: EncodeOptions,
    ) -> Result<UnsignedSwapTx> {
        let ctx = self.swap_context(from_token, to_token, from_amount, &options)?;
        encoder::precheck_mix(route, &ctx)?;

        let mut adapters = Vec::with_capacity(route.best_pool_path.len());
        for pool in &route.best_pool_path {
            adapters.push(self.pool_adapter(pool.pool_type).await?);
        }
        let param = build_mix_swap_param(route, &ctx, &adapters)?;
        let data = encode_mix_swap(&param)?;
        metrics::increment_payload_encoded("mix");
        Ok(UnsignedSwapTx {
            to: self.chain.aggregator,
            data,
            value: ctx.value(),
        })
    }

    /// `multiSwap` transaction for a split route.
    #[tracing::instrument(skip(self, route), level = "debug")]
    pub async fn encode_multi_swap_data(
        &self,
        route: &SplitRouteResult,
        from_token: Address,
        to_token: Address,
        from_amount: U256,
        options: EncodeOptions,
    ) -> Result<UnsignedSwapTx> {
        let ctx = self.swap_context(from_token, to_token, from_amount, &options)?;
        encoder::precheck_multi(route, &ctx)?;

        let mut adapters = Vec::with_capacity(route.best_path_info.one_hops.len());
        for hop in &route.best_path_info.one_hops {
            let mut hop_adapters = Vec::with_capacity(hop.pools.len());
            for pool in &hop.pools {
                hop_adapters.push(self.pool_adapter(pool.pool_type).await?);
            }
            adapters.push(hop_adapters);
        }
        let param = build_multi_swap_param(route, &ctx, &adapters)?;
        let data = encode_multi_swap(&param)?;
        metrics::increment_payload_encoded("multi");
        Ok(UnsignedSwapTx {
            to: self.chain.aggregator,
            data,
            value: ctx.value(),
        })
    }

    /// Current allowance granted to the approve target. Native input needs none.
    pub async fn allowance(&self, token: Address, owner: Address) -> Result<U256> {
        if is_native(token) {
            return Ok(U256::MAX);
        }
        if self.chain.approve_target.is_zero() {
            return Err(AggregatorError::UnsupportedChain(self.chain.chain_id).into());
        }
        self.backend
            .allowance(token, owner, self.chain.approve_target)
            .await
    }

    /// `approve(approveTarget, amount)` on `token`, or `None` for the native asset.
    pub fn build_approve_tx(&self, token: Address, amount: U256) -> Result<Option<UnsignedSwapTx>> {
        if is_native(token) {
            return Ok(None);
        }
        if self.chain.approve_target.is_zero() {
            return Err(AggregatorError::UnsupportedChain(self.chain.chain_id).into());
        }
        let data = crate::contracts::aggregator::encode_call(
            "approve",
            &[Token::Address(self.chain.approve_target), Token::Uint(amount)],
        )?;
        Ok(Some(UnsignedSwapTx {
            to: token,
            data,
            value: U256::zero(),
        }))
    }
}
