use crate::error::AggregatorError;
use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Pool family, numbered as the on-chain liquidity config numbers them.
///
/// The id doubles as the bit index in a dex flag (see `flags::get_dex_flag`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolType {
    UniswapV2,
    UniswapV3,
    Algebra,
    Curve,
    Balancer,
    Dodo,
    Oyster,
    OysterStable,
    Wombat,
}

impl PoolType {
    pub const ALL: [PoolType; 9] = [
        PoolType::UniswapV2,
        PoolType::UniswapV3,
        PoolType::Algebra,
        PoolType::Curve,
        PoolType::Balancer,
        PoolType::Dodo,
        PoolType::Oyster,
        PoolType::OysterStable,
        PoolType::Wombat,
    ];

    pub fn id(self) -> u8 {
        match self {
            PoolType::UniswapV2 => 0,
            PoolType::UniswapV3 => 1,
            PoolType::Algebra => 2,
            PoolType::Curve => 3,
            PoolType::Balancer => 4,
            PoolType::Dodo => 5,
            PoolType::Oyster => 6,
            PoolType::OysterStable => 7,
            PoolType::Wombat => 8,
        }
    }
}

impl TryFrom<u8> for PoolType {
    type Error = AggregatorError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        PoolType::ALL
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or(AggregatorError::UnknownPoolType(id))
    }
}

impl std::fmt::Display for PoolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolType::UniswapV2 => write!(f, "UniswapV2"),
            PoolType::UniswapV3 => write!(f, "UniswapV3"),
            PoolType::Algebra => write!(f, "Algebra"),
            PoolType::Curve => write!(f, "Curve"),
            PoolType::Balancer => write!(f, "Balancer"),
            PoolType::Dodo => write!(f, "Dodo"),
            PoolType::Oyster => write!(f, "Oyster"),
            PoolType::OysterStable => write!(f, "OysterStable"),
            PoolType::Wombat => write!(f, "Wombat"),
        }
    }
}

/// How the aggregator settles against a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SwapType {
    #[default]
    Invalid,
    /// Tokens go straight to the pool
    Direct,
    /// Tokens go to the pool type's adapter contract
    Adapter,
}

impl SwapType {
    pub fn raw(self) -> u8 {
        match self {
            SwapType::Invalid => 0,
            SwapType::Direct => 1,
            SwapType::Adapter => 2,
        }
    }
}

impl From<u8> for SwapType {
    fn from(raw: u8) -> Self {
        match raw {
            1 => SwapType::Direct,
            2 => SwapType::Adapter,
            _ => SwapType::Invalid,
        }
    }
}

/// A two-token pool as reported by the liquidity config. `token0 < token1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub token0: Address,
    pub token1: Address,
    pub pool_addr: Address,
    pub pool_type: PoolType,
    /// Fee tier in the pool's own units
    pub fee: u32,
    pub swap_type: SwapType,
}

impl Pair {
    pub fn is_ordered(&self) -> bool {
        self.token0 < self.token1
    }

    pub fn contains(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// True when selling `sell_token` into this pool means selling token1.
    pub fn sells_token1(&self, sell_token: Address) -> bool {
        sell_token != self.token0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_type_ids_round_trip() {
        for t in PoolType::ALL {
            assert_eq!(PoolType::try_from(t.id()).unwrap(), t);
        }
        assert!(matches!(
            PoolType::try_from(42),
            Err(AggregatorError::UnknownPoolType(42))
        ));
    }

    #[test]
    fn test_swap_type_from_raw() {
        assert_eq!(SwapType::from(1), SwapType::Direct);
        assert_eq!(SwapType::from(2), SwapType::Adapter);
        assert_eq!(SwapType::from(0), SwapType::Invalid);
        assert_eq!(SwapType::from(7), SwapType::Invalid);
    }

    #[test]
    fn test_sells_token1() {
        let pair = Pair {
            token0: Address::from_low_u64_be(1),
            token1: Address::from_low_u64_be(2),
            pool_addr: Address::from_low_u64_be(100),
            pool_type: PoolType::UniswapV2,
            fee: 30,
            swap_type: SwapType::Direct,
        };
        assert!(pair.is_ordered());
        assert!(!pair.sells_token1(pair.token0));
        assert!(pair.sells_token1(pair.token1));
    }
}
