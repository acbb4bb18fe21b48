//! In-memory backend shared by the integration tests.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, BlockId, U256};
use route_aggregator_sdk::backend::{AggregatorBackend, LiquiditySampler, MidPrices};
use route_aggregator_sdk::normalization::{from_base_units, to_base_units};
use route_aggregator_sdk::settings::ChainConfig;
use route_aggregator_sdk::types::{Pair, PoolType, RawSingleRoute, RawSplitRoute, SwapType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn pair(t0: u64, t1: u64, pool: u64, pool_type: PoolType, swap_type: SwapType) -> Pair {
    Pair {
        token0: addr(t0),
        token1: addr(t1),
        pool_addr: addr(pool),
        pool_type,
        fee: 30,
        swap_type,
    }
}

pub fn wrapped_native() -> Address {
    addr(0xee0)
}

pub fn chain() -> ChainConfig {
    ChainConfig {
        chain_id: 1,
        route_helper: addr(0xa1),
        liquidity_config: addr(0xa2),
        aggregator: addr(0xa3),
        approve_target: addr(0xa4),
        multicall: Address::zero(),
        wrapped_native: wrapped_native(),
    }
}

/// Records what the SDK asked for and answers from canned data. Pools listed in `reserves`
/// quote as fee-less constant-product pools with 18/18 decimals.
#[derive(Default)]
pub struct FakeBackend {
    pub adapters: HashMap<PoolType, Address>,
    pub pools: Vec<Pair>,
    pub reserves: HashMap<Address, (f64, f64)>,
    pub single_route: RawSingleRoute,
    pub split_route: RawSplitRoute,
    pub sell_quote: (Address, U256),
    pub mid_price: U256,
    pub allowance: U256,
    pub fail_pool: Option<Address>,

    pub adapter_lookups: AtomicUsize,
    pub batch_lookups: AtomicUsize,
    /// (from, to, mid, amount, flag, direct)
    pub route_queries: Mutex<Vec<(Address, Address, Address, U256, U256, bool)>>,
    /// (token0, token1, flag)
    pub pool_queries: Mutex<Vec<(Address, Address, U256)>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn with_adapters(adapters: &[(PoolType, Address)]) -> Self {
        Self {
            adapters: adapters.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.adapter_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiquiditySampler for FakeBackend {
    async fn get_amounts_out(
        &self,
        pool: Address,
        _pool_type: PoolType,
        is_token0: bool,
        amounts_in: &[U256],
        _block: Option<BlockId>,
    ) -> Result<Vec<U256>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_pool == Some(pool) {
            return Err(anyhow::anyhow!("execution reverted"));
        }
        let (r0, r1) = self.reserves.get(&pool).copied().unwrap_or((0.0, 0.0));
        let (r_in, r_out) = if is_token0 { (r0, r1) } else { (r1, r0) };
        Ok(amounts_in
            .iter()
            .map(|a| {
                let x = from_base_units(*a, 18);
                if r_in + x <= 0.0 {
                    return U256::zero();
                }
                to_base_units(r_out * x / (r_in + x), 18)
            })
            .collect())
    }
}

#[async_trait]
impl AggregatorBackend for FakeBackend {
    async fn get_pools_with_flag(&self, token0: Address, token1: Address, flag: U256) -> Result<Vec<Pair>> {
        self.pool_queries
            .lock()
            .unwrap()
            .push((token0, token1, flag));
        Ok(self.pools.clone())
    }

    async fn get_mid_prices(&self, pools: &[Pair], _is_buy: bool, _block: Option<BlockId>) -> Result<MidPrices> {
        let mut out = MidPrices::default();
        for pool in pools {
            let (r0, r1) = self.reserves.get(&pool.pool_addr).copied().unwrap_or((0.0, 0.0));
            let price = if r0 > 0.0 { r1 / r0 } else { 0.0 };
            out.prices.push(to_base_units(price, 18));
            out.token0_balances.push(to_base_units(r0, 18));
            out.token1_balances.push(to_base_units(r1, 18));
        }
        Ok(out)
    }

    async fn get_pool_adapter(&self, pool_type: PoolType) -> Result<Address> {
        self.adapter_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.adapters.get(&pool_type).copied().unwrap_or_default())
    }

    async fn get_pool_adapters(&self, pool_types: &[PoolType]) -> Result<Vec<Address>> {
        self.batch_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(pool_types
            .iter()
            .map(|t| self.adapters.get(t).copied().unwrap_or_default())
            .collect())
    }

    async fn query_single_route(
        &self,
        from_token: Address,
        to_token: Address,
        amount: U256,
        flag: U256,
        direct: bool,
    ) -> Result<RawSingleRoute> {
        self.route_queries.lock().unwrap().push((
            from_token,
            to_token,
            Address::zero(),
            amount,
            flag,
            direct,
        ));
        Ok(self.single_route.clone())
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
        self.route_queries
            .lock()
            .unwrap()
            .push((from_token, to_token, mid_token, amount, flag, is_direct));
        Ok(self.split_route.clone())
    }

    async fn query_sell(
        &self,
        _adapter: Address,
        _from_token: Address,
        _amount: U256,
        _pool: Address,
    ) -> Result<(Address, U256)> {
        Ok(self.sell_quote)
    }

    async fn get_mid_price_and_balances(
        &self,
        _adapter: Address,
        _pool: Address,
        _is_buy: bool,
    ) -> Result<(U256, U256, U256)> {
        Ok((self.mid_price, U256::zero(), U256::zero()))
    }

    async fn allowance(&self, _token: Address, _owner: Address, _spender: Address) -> Result<U256> {
        Ok(self.allowance)
    }
}
