//! Integration tests for the liquidity pipeline: quotes -> curves -> depth per target price.

mod common;

use common::{addr, chain, pair, FakeBackend};
use route_aggregator_sdk::curve_fitter::{CurveOptions, PairDecimals};
use route_aggregator_sdk::liquidity::LiquidityResult;
use route_aggregator_sdk::settings::{ChainConfig, Settings};
use route_aggregator_sdk::types::{Pair, PoolType, SwapType};
use route_aggregator_sdk::{Aggregator, LiquidityOptions};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const DECIMALS: PairDecimals = PairDecimals {
    token0: 18,
    token1: 18,
};

fn pools(n: u64) -> Vec<Pair> {
    (0..n)
        .map(|i| pair(1, 2, 100 + i, PoolType::UniswapV2, SwapType::Direct))
        .collect()
}

/// Every pool prices token0 at 2.0 token1; depth doubles with each pool
fn backend(pools: &[Pair]) -> FakeBackend {
    let reserves: HashMap<_, _> = pools
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let scale = (1u64 << i) as f64;
            (p.pool_addr, (500.0 * scale, 1_000.0 * scale))
        })
        .collect();
    FakeBackend {
        reserves,
        ..FakeBackend::default()
    }
}

fn options() -> LiquidityOptions {
    LiquidityOptions {
        curve: CurveOptions::default(),
        concurrency: 3,
        block: None,
    }
}

fn amounts(results: &[LiquidityResult], pool: usize, is_buy: bool) -> Vec<f64> {
    results
        .iter()
        .map(|r| {
            if is_buy {
                r.pools[pool].amount0
            } else {
                r.pools[pool].amount1
            }
        })
        .collect()
}

#[tokio::test]
async fn test_liquidity_report_is_ordered_and_monotone() {
    let pools = pools(2);
    let aggregator = Aggregator::with_chain(
        Arc::new(backend(&pools)),
        chain(),
        &Settings::default(),
    );

    let report = aggregator
        .get_pool_liquidity(&pools, DECIMALS, &[0.05, 0.01, 0.02], options())
        .await
        .unwrap();

    assert!((report.mid_price - 2.0).abs() < 1e-9);

    let buy_prices: Vec<f64> = report.buy_liquidity_results.iter().map(|r| r.price).collect();
    let sell_prices: Vec<f64> = report.sell_liquidity_results.iter().map(|r| r.price).collect();
    assert_eq!(buy_prices.len(), 3);
    assert!(buy_prices.windows(2).all(|w| w[0] < w[1]));
    assert!(sell_prices.windows(2).all(|w| w[0] > w[1]));
    assert!((buy_prices[0] - 2.02).abs() < 1e-9);
    assert!((sell_prices[0] - 1.98).abs() < 1e-9);

    for pool in 0..pools.len() {
        let buys = amounts(&report.buy_liquidity_results, pool, true);
        let sells = amounts(&report.sell_liquidity_results, pool, false);
        assert!(buys.windows(2).all(|w| w[0] <= w[1]), "{:?}", buys);
        assert!(sells.windows(2).all(|w| w[0] <= w[1]), "{:?}", sells);
        assert!(buys.iter().chain(&sells).all(|a| *a >= 0.0));
        // buys fill token0 only, sells token1 only
        assert!(report.buy_liquidity_results.iter().all(|r| r.pools[pool].amount1 == 0.0));
        assert!(report.sell_liquidity_results.iter().all(|r| r.pools[pool].amount0 == 0.0));
    }

    // x*y=k with (500, 1000): average buy price 2.02 means 10 token1 in for 5000/1010 token0 out
    let first_buy = report.buy_liquidity_results[0].pools[0].amount0;
    assert!((first_buy - 500.0 / 101.0).abs() < 0.05, "{}", first_buy);
    // average sell price 1.98: 1000/1.98 - 500 token0 in for ~10 token1 out
    let first_sell = report.sell_liquidity_results[0].pools[0].amount1;
    assert!((first_sell - 10.0).abs() < 0.1, "{}", first_sell);
    // the deeper pool offers more at the same price
    assert!(report.buy_liquidity_results[0].pools[1].amount0 > first_buy);
}

#[tokio::test]
async fn test_pool_fits_respect_concurrency_cap() {
    let pools = pools(6);
    let aggregator = Aggregator::with_chain(
        Arc::new(backend(&pools)),
        chain(),
        &Settings::default(),
    );
    let opts = LiquidityOptions {
        curve: CurveOptions {
            ratio: 0.5,
            steps: 20,
            batch_size: 5,
        },
        ..options()
    };

    aggregator
        .get_pool_liquidity(&pools, DECIMALS, &[0.01], opts)
        .await
        .unwrap();

    // three pools at a time, each sampling both directions at once
    let max = aggregator.backend().max_in_flight.load(Ordering::SeqCst);
    assert!(max >= 2, "{}", max);
    assert!(max <= 6, "{}", max);
}

#[tokio::test]
async fn test_quote_failure_propagates() {
    let pools = pools(3);
    let mut fake = backend(&pools);
    fake.fail_pool = Some(addr(101));
    let aggregator = Aggregator::with_chain(Arc::new(fake), chain(), &Settings::default());

    let result = aggregator
        .get_pool_liquidity(&pools, DECIMALS, &[0.01], options())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_empty_inputs_give_empty_report() {
    let pools = pools(2);
    let aggregator = Aggregator::with_chain(
        Arc::new(backend(&pools)),
        chain(),
        &Settings::default(),
    );
    let report = aggregator
        .get_pool_liquidity(&[], DECIMALS, &[0.01], options())
        .await
        .unwrap();
    assert!(report.buy_liquidity_results.is_empty());
    assert!(report.sell_liquidity_results.is_empty());

    let unconfigured = Aggregator::with_chain(
        Arc::new(backend(&pools)),
        ChainConfig::unconfigured(5),
        &Settings::default(),
    );
    let report = unconfigured
        .get_pool_liquidity(&pools, DECIMALS, &[0.01], options())
        .await
        .unwrap();
    assert_eq!(report.mid_price, 0.0);
}
