//! # Router Module
//!
//! Turns raw route-helper results into the canonical route shapes the encoder consumes, and
//! synthesizes single-pool routes that the route helper has no endpoint for.

use crate::normalization::{invert_wad, wad};
use crate::types::conversions::compare_addresses;
use crate::types::pair::{Pair, PoolType, SwapType};
use crate::types::route::{
    OneHop, RawSingleRoute, RawSplitRoute, SingleRouteResult, SplitPathInfo, SplitRouteResult,
};
use ethers::types::{Address, U256};
use log::{debug, warn};
use std::cmp::Ordering;

/// Single and direct routes carry no weights, so they pass through as decoded.
pub fn normalize_single_route(raw: RawSingleRoute) -> SingleRouteResult {
    SingleRouteResult {
        best_amount: raw.best_amount,
        mid_price: raw.mid_price,
        best_path: raw.best_path,
        best_pool_path: raw.best_pool_path,
    }
}

/// Drops every `(pool, weight)` slot whose weight is zero. Running it twice changes nothing.
pub fn filter_zero_weights(info: &SplitPathInfo) -> SplitPathInfo {
    let one_hops = info
        .one_hops
        .iter()
        .map(|hop| {
            let (pools, weights): (Vec<Pair>, Vec<U256>) = hop
                .pools
                .iter()
                .zip(&hop.weights)
                .filter(|(_, w)| !w.is_zero())
                .map(|(p, w)| (p.clone(), *w))
                .unzip();
            OneHop { pools, weights }
        })
        .collect();
    SplitPathInfo {
        tokens: info.tokens.clone(),
        one_hops,
        final_amount_out: info.final_amount_out,
        is_valid: info.is_valid,
    }
}

pub fn normalize_split_route(raw: RawSplitRoute) -> SplitRouteResult {
    let info = filter_zero_weights(&raw.best_path_info);
    if info.is_valid {
        if let Err(e) = info.check_invariants() {
            warn!("Split route {} breaks route invariants: {}", route_id(&info), e);
        }
    }
    debug!(
        "Split route {} -> {} hops, amount {}",
        route_id(&info),
        info.one_hops.len(),
        raw.best_amount
    );
    SplitRouteResult {
        best_amount: raw.best_amount,
        mid_price: raw.mid_price,
        best_path_info: info,
    }
}

/// Builds a one-hop, one-pool route at full weight for a pool quoted off-chain.
///
/// `from < to` (address order) means `from` is token0; the pool's mid price comes back in
/// from-token terms and is inverted otherwise so it always reads token1 per token0.
pub fn build_one_pool_route(
    from_token: Address,
    to_token: Address,
    pool_addr: Address,
    pool_type: PoolType,
    swap_type: SwapType,
    amount_out: U256,
    mid_price: U256,
) -> SplitRouteResult {
    let is_buy = compare_addresses(from_token, to_token) == Ordering::Less;
    let (token0, token1) = if is_buy {
        (from_token, to_token)
    } else {
        (to_token, from_token)
    };
    let mid_price = if is_buy { mid_price } else { invert_wad(mid_price) };

    let pool = Pair {
        token0,
        token1,
        pool_addr,
        pool_type,
        fee: 0,
        swap_type,
    };
    SplitRouteResult {
        best_amount: amount_out,
        mid_price,
        best_path_info: SplitPathInfo {
            tokens: vec![from_token, to_token],
            one_hops: vec![OneHop {
                pools: vec![pool],
                weights: vec![wad()],
            }],
            final_amount_out: amount_out,
            is_valid: !amount_out.is_zero(),
        },
    }
}

/// Generate a route identifier based on pool addresses.
pub fn route_id(info: &SplitPathInfo) -> String {
    info.one_hops
        .iter()
        .map(|hop| {
            hop.pools
                .iter()
                .map(|p| format!("{:?}", p.pool_addr))
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join("-")
}
