// src/liquidity.rs
//
// Depth-at-price analysis over fitted pool curves. Everything here is pure: the chain reads
// happen in the facade and the curve fitter.

use crate::curve_fitter::{Direction, PoolCurve, PoolCurves};
use ethers::types::Address;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Amounts one pool offers at a given price. Only the side the direction produces is filled:
/// `amount0` for buys, `amount1` for sells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolLiquidity {
    pub pool: Address,
    pub amount0: f64,
    pub amount1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityResult {
    pub price: f64,
    pub pools: Vec<PoolLiquidity>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoolLiquidityReport {
    pub mid_price: f64,
    pub buy_liquidity_results: Vec<LiquidityResult>,
    pub sell_liquidity_results: Vec<LiquidityResult>,
}

/// Evaluates a curve at `price`.
///
/// The first segment containing the price wins. Past the far end of the curve (above it for
/// buys, below it for sells) the pool saturates at that boundary segment. On the near-mid side
/// of the curve the pool reports no liquidity; that side is deliberately not clamped.
pub fn evaluate_curve(segments: &[PoolCurve], price: f64, direction: Direction) -> f64 {
    if let Some(seg) = segments.iter().find(|s| s.contains(price)) {
        return seg.evaluate(price);
    }
    match direction {
        Direction::Buy => {
            let top = segments
                .iter()
                .max_by(|a, b| a.range.max.total_cmp(&b.range.max));
            match top {
                Some(seg) if price > seg.range.max => seg.evaluate(seg.range.max),
                _ => 0.0,
            }
        }
        Direction::Sell => {
            let bottom = segments
                .iter()
                .min_by(|a, b| a.range.min.total_cmp(&b.range.min));
            match bottom {
                Some(seg) if price < seg.range.min => seg.evaluate(seg.range.min),
                _ => 0.0,
            }
        }
    }
}

/// Depth per `(price, pool)`. Pools without curves report zeros.
pub fn compute_liquidity(
    pools: &[Address],
    curves: &HashMap<Address, PoolCurves>,
    prices: &[f64],
    is_buy: bool,
) -> Vec<LiquidityResult> {
    let direction = if is_buy { Direction::Buy } else { Direction::Sell };
    prices
        .iter()
        .map(|&price| LiquidityResult {
            price,
            pools: pools
                .iter()
                .map(|&pool| {
                    let amount = curves
                        .get(&pool)
                        .map(|c| evaluate_curve(c.for_direction(direction), price, direction))
                        .unwrap_or(0.0);
                    if is_buy {
                        PoolLiquidity {
                            pool,
                            amount0: amount,
                            amount1: 0.0,
                        }
                    } else {
                        PoolLiquidity {
                            pool,
                            amount0: 0.0,
                            amount1: amount,
                        }
                    }
                })
                .collect(),
        })
        .collect()
}

/// Orders results away from mid (ascending for buys, descending for sells) and makes each
/// pool's amount non-decreasing along that order by carrying the running maximum forward.
pub fn adjust_liquidity_results(results: &[LiquidityResult], is_buy: bool) -> Vec<LiquidityResult> {
    let mut sorted = results.to_vec();
    if is_buy {
        sorted.sort_by(|a, b| a.price.total_cmp(&b.price));
    } else {
        sorted.sort_by(|a, b| b.price.total_cmp(&a.price));
    }

    let mut peaks: HashMap<Address, f64> = HashMap::new();
    for result in sorted.iter_mut() {
        for entry in result.pools.iter_mut() {
            let amount = if is_buy { entry.amount0 } else { entry.amount1 };
            match peaks.get(&entry.pool) {
                Some(&peak) if amount <= peak => {
                    if is_buy {
                        entry.amount0 = peak;
                    } else {
                        entry.amount1 = peak;
                    }
                }
                _ => {
                    peaks.insert(entry.pool, amount);
                }
            }
        }
    }
    sorted
}

/// Query prices for a side of the book: `mid × (1 + m)` for buys, `mid × (1 − m)` for sells.
/// Prices that come out non-positive or non-finite are left out.
pub fn target_prices(mid_price: f64, multipliers: &[f64], is_buy: bool) -> Vec<f64> {
    multipliers
        .iter()
        .map(|m| {
            if is_buy {
                mid_price * (1.0 + m)
            } else {
                mid_price * (1.0 - m)
            }
        })
        .filter(|p| p.is_finite() && *p > 0.0)
        .collect()
}

/// Mid price from per-pool quotes: the average of the best ask (lowest positive buy price) and
/// the best bid (highest sell price). One-sided books fall back to the side that exists.
pub fn mid_price_from_quotes(buy_prices: &[f64], sell_prices: &[f64]) -> f64 {
    let best_ask = buy_prices
        .iter()
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .min_by(|a, b| a.total_cmp(b));
    let best_bid = sell_prices
        .iter()
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .max_by(|a, b| a.total_cmp(b));
    match (best_ask, best_bid) {
        (Some(ask), Some(bid)) => (ask + bid) / 2.0,
        (Some(p), None) | (None, Some(p)) => p,
        (None, None) => 0.0,
    }
}

/// Rough trade size that moves a constant-product pool from `mid_price` to `target_price`:
/// half the relative move applied to the input-side balance.
pub fn heuristic_trade_size(balance: f64, mid_price: f64, target_price: f64) -> f64 {
    if mid_price <= 0.0 || balance <= 0.0 {
        return 0.0;
    }
    balance * (target_price / mid_price - 1.0).abs() / 2.0
}

/// Output amount a pool can deliver before its price reaches `target_price`, read from the
/// fitted curve. A pool whose quotes failed (empty curve) gets the caller's heuristic size.
pub fn trade_size_for_price(
    curves: &PoolCurves,
    direction: Direction,
    target_price: f64,
    fallback_size: f64,
) -> f64 {
    let segments = curves.for_direction(direction);
    if segments.is_empty() {
        warn!(
            "No {:?} curve to size a trade at price {}, using heuristic size {}",
            direction, target_price, fallback_size
        );
        return fallback_size;
    }
    evaluate_curve(segments, target_price, direction)
}
