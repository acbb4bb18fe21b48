//! Integration tests for route queries through the aggregator facade.

mod common;

use common::{addr, chain, pair, wrapped_native, FakeBackend};
use ethers::types::{Address, U256};
use route_aggregator_sdk::flags::{get_dex_flag, get_split_dex_flag};
use route_aggregator_sdk::normalization::wad;
use route_aggregator_sdk::settings::{ChainConfig, Settings};
use route_aggregator_sdk::types::conversions::eth_address;
use route_aggregator_sdk::types::{OneHop, PoolType, RawSplitRoute, SplitPathInfo, SwapType};
use route_aggregator_sdk::Aggregator;
use std::sync::Arc;

fn aggregator(backend: FakeBackend) -> Aggregator<FakeBackend> {
    Aggregator::with_chain(Arc::new(backend), chain(), &Settings::default())
}

/// A -> B split over three pools (one zero-weight slot), B -> C over two (one zero-weight slot)
fn padded_split_route() -> RawSplitRoute {
    let quarter = wad() / 4;
    let v2 = |t0, t1, p| pair(t0, t1, p, PoolType::UniswapV2, SwapType::Direct);
    RawSplitRoute {
        best_amount: U256::from(990_000u64),
        mid_price: wad(),
        best_path_info: SplitPathInfo {
            tokens: vec![addr(1), addr(2), addr(3)],
            one_hops: vec![
                OneHop {
                    pools: vec![v2(1, 2, 10), v2(1, 2, 11), v2(1, 2, 12)],
                    weights: vec![quarter, U256::zero(), quarter * 3],
                },
                OneHop {
                    pools: vec![v2(2, 3, 20), v2(2, 3, 21)],
                    weights: vec![U256::zero(), wad()],
                },
            ],
            final_amount_out: U256::from(990_000u64),
            is_valid: true,
        },
    }
}

#[tokio::test]
async fn test_split_route_is_normalized() {
    let backend = FakeBackend {
        split_route: padded_split_route(),
        ..FakeBackend::default()
    };
    let aggregator = aggregator(backend);

    let route = aggregator
        .query_split_route(
            addr(1),
            addr(3),
            U256::from(1_000_000u64),
            false,
            &[PoolType::Curve],
            Some(3),
            None,
        )
        .await
        .unwrap();

    let info = &route.best_path_info;
    assert!(info.is_valid);
    assert_eq!(route.best_amount, info.final_amount_out);
    assert_eq!(route.best_amount, U256::from(990_000u64));
    assert_eq!(info.tokens.len(), info.one_hops.len() + 1);
    for hop in &info.one_hops {
        assert_eq!(hop.pools.len(), hop.weights.len());
        assert!(hop.weights.iter().all(|w| !w.is_zero()));
        assert_eq!(hop.weight_sum(), wad());
        for pool in &hop.pools {
            assert!(info.tokens.contains(&pool.token0));
            assert!(info.tokens.contains(&pool.token1));
        }
    }
    assert_eq!(info.one_hops[0].pools.len(), 2);
    assert_eq!(info.one_hops[1].pools[0].pool_addr, addr(21));
    assert!(info.check_invariants().is_ok());

    let queries = aggregator.backend().route_queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    let (from, to, mid, _, flag, is_direct) = queries[0];
    assert_eq!((from, to, mid), (addr(1), addr(3), Address::zero()));
    assert_eq!(flag, get_split_dex_flag(&[PoolType::Curve], Some(3)));
    assert!(!is_direct);
}

#[tokio::test]
async fn test_native_tokens_are_queried_as_wrapped() {
    let aggregator = aggregator(FakeBackend::default());
    aggregator
        .query_split_route(
            Address::zero(),
            addr(3),
            U256::from(5u64),
            true,
            &[],
            None,
            Some(eth_address()),
        )
        .await
        .unwrap();
    aggregator
        .query_single_route(addr(3), eth_address(), U256::from(5u64), &[])
        .await
        .unwrap();

    let queries = aggregator.backend().route_queries.lock().unwrap().clone();
    assert_eq!(queries[0].0, wrapped_native());
    assert_eq!(queries[0].2, wrapped_native());
    assert!(queries[0].5);
    assert_eq!(queries[1].1, wrapped_native());
}

#[tokio::test]
async fn test_direct_and_single_routes_use_their_endpoints() {
    let aggregator = aggregator(FakeBackend::default());
    let exclude = [PoolType::Balancer, PoolType::Wombat];
    aggregator
        .query_direct_route(addr(1), addr(2), U256::one(), &exclude)
        .await
        .unwrap();
    aggregator
        .query_single_route(addr(1), addr(2), U256::one(), &exclude)
        .await
        .unwrap();

    let queries = aggregator.backend().route_queries.lock().unwrap().clone();
    assert!(queries[0].5, "direct route must ask for one-hop paths");
    assert!(!queries[1].5);
    assert_eq!(queries[0].4, get_dex_flag(&exclude));
}

#[tokio::test]
async fn test_unsupported_chain_returns_empty_results() {
    let aggregator = Aggregator::with_chain(
        Arc::new(FakeBackend {
            split_route: padded_split_route(),
            ..FakeBackend::default()
        }),
        ChainConfig::unconfigured(4242),
        &Settings::default(),
    );

    let single = aggregator
        .query_single_route(addr(1), addr(2), U256::one(), &[])
        .await
        .unwrap();
    let split = aggregator
        .query_split_route(addr(1), addr(2), U256::one(), false, &[], None, None)
        .await
        .unwrap();
    let pools = aggregator.get_pool_list(addr(1), addr(2), &[]).await.unwrap();

    assert!(single.is_empty());
    assert!(split.is_empty());
    assert!(pools.is_empty());
    assert!(aggregator.backend().route_queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_one_pool_route_uses_cached_default_adapter() {
    let backend = FakeBackend {
        sell_quote: (addr(2), U256::from(500u64)),
        mid_price: U256::from(4u64) * wad(),
        ..FakeBackend::with_adapters(&[(PoolType::Oyster, addr(700))])
    };
    let aggregator = aggregator(backend);

    // from > to: the pool's mid price is reported the other way round
    let route = aggregator
        .query_one_pool_route(addr(9), addr(2), U256::from(1_000u64), addr(50), None)
        .await
        .unwrap();
    assert_eq!(route.best_amount, U256::from(500u64));
    assert_eq!(route.mid_price, wad() / 4);
    let info = &route.best_path_info;
    assert_eq!(info.tokens, vec![addr(9), addr(2)]);
    assert_eq!(info.one_hops[0].weights, vec![wad()]);
    assert_eq!(info.one_hops[0].pools[0].pool_type, PoolType::Oyster);
    assert_eq!(info.one_hops[0].pools[0].swap_type, SwapType::Adapter);
    assert!(info.is_valid);

    aggregator
        .query_one_pool_route(addr(2), addr(9), U256::from(1_000u64), addr(50), None)
        .await
        .unwrap();
    assert_eq!(aggregator.backend().lookups(), 1);
    assert_eq!(aggregator.cached_adapter(PoolType::Oyster), Some(addr(700)));
}

#[tokio::test]
async fn test_pool_list_orders_tokens() {
    let pools = vec![pair(1, 2, 10, PoolType::UniswapV3, SwapType::Direct)];
    let backend = FakeBackend {
        pools: pools.clone(),
        ..FakeBackend::default()
    };
    let aggregator = aggregator(backend);

    let listed = aggregator
        .get_pool_list(addr(2), addr(1), &[PoolType::Dodo])
        .await
        .unwrap();
    assert_eq!(listed, pools);

    let queries = aggregator.backend().pool_queries.lock().unwrap().clone();
    assert_eq!(queries, vec![(addr(1), addr(2), get_dex_flag(&[PoolType::Dodo]))]);
}
