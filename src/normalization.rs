// src/normalization.rs
//
// Fixed-point helpers. Prices and split weights travel as WAD (1e18) integers on-chain and as
// f64 in the curve math; this module owns the conversions between the two.

use ethers::types::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Fixed-point scale (1e18) used for prices and split weights
pub const WAD: u128 = 1_000_000_000_000_000_000u128;

/// Basis-point denominator for slippage and broker fee rates
pub const RATIO_BASE: u64 = 10_000;

#[inline]
pub fn wad() -> U256 {
    U256::from(WAD)
}

/// Safe multiply then divide: (a * b) / denom with U256, returning floor.
/// Handles overflow by saturating multiplication.
#[inline]
pub fn mul_div_floor(a: U256, b: U256, denom: U256) -> U256 {
    if a.is_zero() || b.is_zero() {
        return U256::zero();
    }
    if denom.is_zero() {
        return U256::zero(); // Avoid division by zero
    }
    let prod = a.full_mul(b);
    let quotient = prod / ethers::types::U512::from(denom);
    quotient.try_into().unwrap_or(U256::MAX)
}

/// a * b / 1e18
#[inline]
pub fn wad_mul(a: U256, b: U256) -> U256 {
    mul_div_floor(a, b, wad())
}

/// a * 1e18 / b
#[inline]
pub fn wad_div(a: U256, b: U256) -> U256 {
    mul_div_floor(a, wad(), b)
}

/// Inverts a WAD price: 1e36 / price. Zero stays zero.
pub fn invert_wad(price: U256) -> U256 {
    if price.is_zero() {
        return U256::zero();
    }
    mul_div_floor(wad(), wad(), price)
}

/// bestAmount * (10000 - slippage) / 10000, floored.
pub fn min_return_amount(best_amount: U256, slippage_bps: u64) -> U256 {
    let keep = RATIO_BASE.saturating_sub(slippage_bps);
    mul_div_floor(best_amount, U256::from(keep), U256::from(RATIO_BASE))
}

/// Helper: 10^n as u128, returns None if overflow (n > 38)
#[inline]
pub fn pow10_u128(n: u8) -> Option<u128> {
    10u128.checked_pow(n as u32)
}

fn pow10_decimal(n: u8) -> Option<Decimal> {
    // Decimal holds 28 significant digits
    if n > 28 {
        return None;
    }
    pow10_u128(n).map(Decimal::from)
}

/// Base units -> human float. Goes through Decimal first so amounts above 2^53 keep their
/// leading digits; falls back to a lossy float path when Decimal overflows.
pub fn from_base_units(amount: U256, decimals: u8) -> f64 {
    if amount.is_zero() {
        return 0.0;
    }
    if let (Ok(value), Some(scale)) = (
        Decimal::from_str(&amount.to_string()),
        pow10_decimal(decimals),
    ) {
        if let Some(f) = (value / scale).to_f64() {
            return f;
        }
    }
    let raw: f64 = amount.to_string().parse().unwrap_or(0.0);
    raw / 10f64.powi(decimals as i32)
}

/// Human float -> base units (floor). Negative, NaN and infinite inputs map to zero.
pub fn to_base_units(value: f64, decimals: u8) -> U256 {
    if !value.is_finite() || value <= 0.0 {
        return U256::zero();
    }
    let scaled = value * 10f64.powi(decimals as i32);
    if scaled < 1.0 {
        return U256::zero();
    }
    match Decimal::from_f64_retain(scaled) {
        Some(d) => U256::from_dec_str(&d.trunc().to_string()).unwrap_or_else(|_| U256::zero()),
        // Beyond Decimal's range: format the float without exponent
        None => U256::from_dec_str(&format!("{:.0}", scaled.trunc())).unwrap_or_else(|_| U256::zero()),
    }
}

/// WAD integer -> float (1e18 == 1.0)
pub fn wad_to_f64(value: U256) -> f64 {
    from_base_units(value, 18)
}
