// src/flags.rs
//
// Bit-packing helpers shared by the route queries and the payload encoder.

use crate::types::pair::PoolType;
use ethers::types::U256;

/// Bit offset of the split-count field inside a split-route dex flag
pub const SPLIT_COUNT_SHIFT: usize = 127;

/// Bitmap with bit `k` set for every pool type id `k`. Order and duplicates do not matter.
pub fn get_dex_flag(pool_types: &[PoolType]) -> U256 {
    pool_types
        .iter()
        .fold(U256::zero(), |flag, t| flag | (U256::one() << t.id() as usize))
}

/// Dex flag for split queries: the pool-type bitmap plus the split count packed at bit 127.
pub fn get_split_dex_flag(pool_types: &[PoolType], split_count: Option<u32>) -> U256 {
    let flag = get_dex_flag(pool_types);
    match split_count {
        Some(count) if count > 0 => flag | (U256::from(count) << SPLIT_COUNT_SHIFT),
        _ => flag,
    }
}

/// Whether pool type `t` is marked in `flag`
pub fn has_pool_type(flag: U256, t: PoolType) -> bool {
    flag.bit(t.id() as usize)
}

/// Packs one bit per hop: bit `i` set iff hop `i` sells token1.
pub fn pack_directions(sells_token1: &[bool]) -> U256 {
    sells_token1
        .iter()
        .enumerate()
        .filter(|(_, s)| **s)
        .fold(U256::zero(), |acc, (i, _)| acc | (U256::one() << i))
}

/// `direction + (edition << 1) + (weight << 3)`; edition is the low 3 bits of the swap type.
pub fn pack_sequence_word(sells_token1: bool, swap_type_raw: u8, weight: U256) -> U256 {
    let direction = if sells_token1 { U256::one() } else { U256::zero() };
    let edition = U256::from(swap_type_raw & 0x07);
    direction + (edition << 1) + (weight << 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dex_flag_bits() {
        assert_eq!(get_dex_flag(&[PoolType::Algebra]), U256::from(4u64));
        assert_eq!(
            get_dex_flag(&[PoolType::Algebra, PoolType::Curve]),
            U256::from(12u64)
        );
        assert_eq!(get_dex_flag(&[]), U256::zero());
    }

    #[test]
    fn test_dex_flag_order_and_duplicates() {
        let a = get_dex_flag(&[PoolType::Oyster, PoolType::UniswapV2, PoolType::Dodo]);
        let b = get_dex_flag(&[
            PoolType::Dodo,
            PoolType::Oyster,
            PoolType::Dodo,
            PoolType::UniswapV2,
            PoolType::Oyster,
        ]);
        assert_eq!(a, b);
        for t in PoolType::ALL {
            let expected = matches!(t, PoolType::Oyster | PoolType::UniswapV2 | PoolType::Dodo);
            assert_eq!(has_pool_type(a, t), expected, "{:?}", t);
        }
        assert_eq!(a, U256::from(1u64 | (1 << 5) | (1 << 6)));
    }

    #[test]
    fn test_split_flag_packs_count_high() {
        let flag = get_split_dex_flag(&[PoolType::UniswapV3], Some(3));
        assert_eq!(flag >> SPLIT_COUNT_SHIFT, U256::from(3u64));
        assert!(has_pool_type(flag, PoolType::UniswapV3));
        assert_eq!(
            get_split_dex_flag(&[PoolType::UniswapV3], None),
            get_dex_flag(&[PoolType::UniswapV3])
        );
    }

    #[test]
    fn test_pack_directions() {
        assert_eq!(pack_directions(&[false, true, true]), U256::from(6u64));
        assert_eq!(pack_directions(&[true]), U256::one());
        assert_eq!(pack_directions(&[]), U256::zero());
    }

    #[test]
    fn test_pack_sequence_word() {
        // direction 1, edition 2, weight 5 -> 1 + 4 + 40
        assert_eq!(
            pack_sequence_word(true, 2, U256::from(5u64)),
            U256::from(45u64)
        );
        // only the low 3 bits of the swap type are used
        assert_eq!(
            pack_sequence_word(false, 0b1001, U256::zero()),
            U256::from(2u64)
        );
    }
}
