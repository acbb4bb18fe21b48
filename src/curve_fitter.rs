//! # Liquidity Curve Fitter
//!
//! Approximates a pool's depth as a function of execution price from a handful of on-chain
//! quotes. For each direction the fitter probes the pool with growing input amounts, discards
//! the saturated tail and any non-monotone noise, then fits a natural cubic spline through the
//! surviving `(price, amount_out)` points.
//!
//! Prices are always token1 per token0 in human units, so the sell curve (token0 in) falls as
//! size grows and the buy curve (token1 in) rises.

use crate::backend::LiquiditySampler;
use crate::normalization::{from_base_units, to_base_units};
use crate::types::pair::Pair;
use anyhow::Result;
use ethers::types::{BlockId, U256};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// First probe as a fraction of the largest probe
const FIRST_PROBE_FRACTION: f64 = 0.0001;

/// Sampling knobs for one pool fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveOptions {
    /// Fraction of the input-side balance to probe up to
    pub ratio: f64,
    pub steps: usize,
    /// Amounts per `getAmountsOut` call
    pub batch_size: usize,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            ratio: 0.5,
            steps: 50,
            batch_size: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// token0 in, token1 out
    Sell,
    /// token1 in, token0 out
    Buy,
}

impl Direction {
    pub fn is_buy(self) -> bool {
        matches!(self, Direction::Buy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveRange {
    pub min: f64,
    pub max: f64,
}

/// One spline segment: `a + b·dx + c·dx² + d·dx³` with `dx = price - range.min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolCurve {
    pub range: CurveRange,
    pub coefficients: [f64; 4],
}

impl PoolCurve {
    pub fn contains(&self, price: f64) -> bool {
        let lo = self.range.min.min(self.range.max);
        let hi = self.range.min.max(self.range.max);
        price >= lo && price <= hi
    }

    pub fn evaluate(&self, price: f64) -> f64 {
        let [a, b, c, d] = self.coefficients;
        let dx = price - self.range.min;
        a + dx * (b + dx * (c + dx * d))
    }
}

/// Both fitted directions of one pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolCurves {
    pub sell_curves: Vec<PoolCurve>,
    pub buy_curves: Vec<PoolCurve>,
}

impl PoolCurves {
    pub fn for_direction(&self, direction: Direction) -> &[PoolCurve] {
        match direction {
            Direction::Sell => &self.sell_curves,
            Direction::Buy => &self.buy_curves,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDecimals {
    pub token0: u8,
    pub token1: u8,
}

impl PairDecimals {
    /// (input decimals, output decimals) for a direction
    fn io(self, direction: Direction) -> (u8, u8) {
        match direction {
            Direction::Sell => (self.token0, self.token1),
            Direction::Buy => (self.token1, self.token0),
        }
    }
}

/// `steps + 1` human-unit probe sizes: a tiny first probe, then `step..=max` evenly spaced.
pub fn probe_amounts(balance: f64, ratio: f64, steps: usize) -> Vec<f64> {
    if steps == 0 || !balance.is_finite() || balance <= 0.0 {
        return Vec::new();
    }
    let max = balance * ratio;
    let step = max / steps as f64;
    let mut amounts = Vec::with_capacity(steps + 1);
    amounts.push(max * FIRST_PROBE_FRACTION);
    amounts.extend((1..=steps).map(|i| step * i as f64));
    amounts
}

/// Length of the prefix that still produces marginal output: the series is cut at the first
/// index whose output repeats the previous one.
pub fn saturation_cutoff<T: PartialEq>(amounts_out: &[T]) -> usize {
    amounts_out
        .windows(2)
        .position(|w| w[1] == w[0])
        .map(|i| i + 1)
        .unwrap_or(amounts_out.len())
}

/// Converts `(amount_in, amount_out)` human pairs into `(price, amount_out)` and keeps only the
/// points that move price away from mid (down for sell, up for buy) while adding output.
pub fn filter_monotone(samples: &[(f64, f64)], direction: Direction) -> Vec<(f64, f64)> {
    let mut kept: Vec<(f64, f64)> = Vec::with_capacity(samples.len());
    for &(amount_in, amount_out) in samples {
        if amount_in <= 0.0 || amount_out <= 0.0 {
            continue;
        }
        let price = match direction {
            Direction::Sell => amount_out / amount_in,
            Direction::Buy => amount_in / amount_out,
        };
        if !price.is_finite() {
            continue;
        }
        let accept = match kept.last() {
            None => true,
            Some(&(last_price, last_out)) => {
                let price_ok = match direction {
                    Direction::Sell => price < last_price,
                    Direction::Buy => price > last_price,
                };
                price_ok && amount_out > last_out
            }
        };
        if accept {
            kept.push((price, amount_out));
        }
    }
    kept
}

/// Natural cubic spline through points with strictly increasing x.
/// Returns one segment per consecutive pair; fewer than two points give an empty curve.
pub fn natural_cubic_spline(points: &[(f64, f64)]) -> Vec<PoolCurve> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let m = n - 1;
    let x: Vec<f64> = points.iter().map(|p| p.0).collect();
    let a: Vec<f64> = points.iter().map(|p| p.1).collect();
    let h: Vec<f64> = (0..m).map(|i| x[i + 1] - x[i]).collect();
    if h.iter().any(|hi| !(*hi > 0.0)) {
        warn!("Spline knots are not strictly increasing, skipping fit");
        return Vec::new();
    }

    let mut alpha = vec![0.0; n];
    for i in 1..m {
        alpha[i] = 3.0 / h[i] * (a[i + 1] - a[i]) - 3.0 / h[i - 1] * (a[i] - a[i - 1]);
    }

    // Forward elimination
    let mut l = vec![1.0; n];
    let mut mu = vec![0.0; n];
    let mut z = vec![0.0; n];
    for i in 1..m {
        l[i] = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
        mu[i] = h[i] / l[i];
        z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l[i];
    }

    // Back substitution, natural boundary c[n-1] = 0
    let mut b = vec![0.0; m];
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; m];
    for j in (0..m).rev() {
        c[j] = z[j] - mu[j] * c[j + 1];
        b[j] = (a[j + 1] - a[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
        d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
    }

    (0..m)
        .map(|j| PoolCurve {
            range: CurveRange {
                min: x[j],
                max: x[j + 1],
            },
            coefficients: [a[j], b[j], c[j], d[j]],
        })
        .collect()
}

/// Pure part of a fit: truncate, filter and spline one direction's raw quotes.
pub fn build_curve(
    amounts_in: &[U256],
    amounts_out: &[U256],
    decimals: PairDecimals,
    direction: Direction,
) -> Vec<PoolCurve> {
    let len = amounts_in.len().min(amounts_out.len());
    let cutoff = saturation_cutoff(&amounts_out[..len]);
    let (in_dec, out_dec) = decimals.io(direction);
    let samples: Vec<(f64, f64)> = amounts_in[..cutoff]
        .iter()
        .zip(&amounts_out[..cutoff])
        .map(|(i, o)| (from_base_units(*i, in_dec), from_base_units(*o, out_dec)))
        .collect();

    let mut points = filter_monotone(&samples, direction);
    // Sell prices fall with size; the spline wants increasing knots
    points.sort_by(|p, q| p.0.total_cmp(&q.0));
    debug!(
        "{:?} curve: {} quotes, {} before saturation, {} knots",
        direction,
        len,
        cutoff,
        points.len()
    );
    natural_cubic_spline(&points)
}

async fn sample_direction<S: LiquiditySampler + ?Sized>(
    sampler: &S,
    pool: &Pair,
    balance: f64,
    decimals: PairDecimals,
    direction: Direction,
    options: &CurveOptions,
    block: Option<BlockId>,
) -> Result<Vec<PoolCurve>> {
    let (in_dec, _) = decimals.io(direction);
    let amounts_in: Vec<U256> = probe_amounts(balance, options.ratio, options.steps)
        .into_iter()
        .map(|a| to_base_units(a, in_dec))
        .collect();
    if amounts_in.is_empty() {
        return Ok(Vec::new());
    }

    let is_token0 = !direction.is_buy();
    let mut amounts_out = Vec::with_capacity(amounts_in.len());
    for batch in amounts_in.chunks(options.batch_size.max(1)) {
        let out = sampler
            .get_amounts_out(pool.pool_addr, pool.pool_type, is_token0, batch, block)
            .await?;
        if out.len() != batch.len() {
            warn!(
                "getAmountsOut for {:?} returned {} amounts for {} inputs",
                pool.pool_addr,
                out.len(),
                batch.len()
            );
        }
        amounts_out.extend(out);
    }
    Ok(build_curve(&amounts_in, &amounts_out, decimals, direction))
}

/// Fits sell and buy curves for one pool. Balances are human units.
pub async fn fit_pool_curves<S: LiquiditySampler + ?Sized>(
    sampler: &S,
    pool: &Pair,
    token0_balance: f64,
    token1_balance: f64,
    decimals: PairDecimals,
    options: &CurveOptions,
    block: Option<BlockId>,
) -> Result<PoolCurves> {
    let (sell_curves, buy_curves) = tokio::try_join!(
        sample_direction(
            sampler,
            pool,
            token0_balance,
            decimals,
            Direction::Sell,
            options,
            block
        ),
        sample_direction(
            sampler,
            pool,
            token1_balance,
            decimals,
            Direction::Buy,
            options,
            block
        ),
    )?;
    Ok(PoolCurves {
        sell_curves,
        buy_curves,
    })
}
