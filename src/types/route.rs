use crate::error::AggregatorError;
use crate::normalization::wad;
use crate::types::pair::Pair;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// One token-to-token leg, possibly split across several pools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OneHop {
    pub pools: Vec<Pair>,
    /// WAD fraction of the hop's input routed through `pools[i]`
    pub weights: Vec<U256>,
}

impl OneHop {
    pub fn is_split(&self) -> bool {
        self.pools.len() > 1
    }

    pub fn weight_sum(&self) -> U256 {
        self.weights
            .iter()
            .fold(U256::zero(), |acc, w| acc.saturating_add(*w))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SplitPathInfo {
    pub tokens: Vec<Address>,
    pub one_hops: Vec<OneHop>,
    pub final_amount_out: U256,
    pub is_valid: bool,
}

impl SplitPathInfo {
    /// Checks the shape a settlement payload relies on: one more token than hops, parallel
    /// pool/weight arrays, strictly positive weights summing to 1 WAD, and every pool's tokens
    /// present on the path.
    pub fn check_invariants(&self) -> Result<(), AggregatorError> {
        if self.tokens.len() != self.one_hops.len() + 1 {
            return Err(AggregatorError::LengthMismatch {
                what: "route tokens",
                expected: self.one_hops.len() + 1,
                actual: self.tokens.len(),
            });
        }
        for (i, hop) in self.one_hops.iter().enumerate() {
            if hop.pools.len() != hop.weights.len() {
                return Err(AggregatorError::LengthMismatch {
                    what: "hop weights",
                    expected: hop.pools.len(),
                    actual: hop.weights.len(),
                });
            }
            if hop.pools.is_empty() {
                return Err(AggregatorError::InvalidRoute(format!("hop {} has no pools", i)));
            }
            if hop.weights.iter().any(|w| w.is_zero()) {
                return Err(AggregatorError::InvalidRoute(format!(
                    "hop {} keeps a zero weight",
                    i
                )));
            }
            if hop.weight_sum() != wad() {
                return Err(AggregatorError::InvalidRoute(format!(
                    "hop {} weights sum to {}",
                    i,
                    hop.weight_sum()
                )));
            }
            for pool in &hop.pools {
                if !self.tokens.contains(&pool.token0) || !self.tokens.contains(&pool.token1) {
                    return Err(AggregatorError::InvalidRoute(format!(
                        "pool {:?} in hop {} trades tokens off the path",
                        pool.pool_addr, i
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Route-helper response for single-path queries, as decoded from the contract.
#[derive(Debug, Clone, Default)]
pub struct RawSingleRoute {
    pub best_amount: U256,
    pub mid_price: U256,
    pub best_path: Vec<Address>,
    pub best_pool_path: Vec<Pair>,
}

/// Route-helper response for split queries. Hops may carry zero-weight padding slots.
#[derive(Debug, Clone, Default)]
pub struct RawSplitRoute {
    pub best_amount: U256,
    pub mid_price: U256,
    pub best_path_info: SplitPathInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SingleRouteResult {
    pub best_amount: U256,
    /// WAD, token1 per token0
    pub mid_price: U256,
    pub best_path: Vec<Address>,
    pub best_pool_path: Vec<Pair>,
}

impl SingleRouteResult {
    pub fn is_empty(&self) -> bool {
        self.best_pool_path.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SplitRouteResult {
    pub best_amount: U256,
    pub mid_price: U256,
    pub best_path_info: SplitPathInfo,
}

impl SplitRouteResult {
    pub fn is_empty(&self) -> bool {
        self.best_path_info.one_hops.is_empty()
    }
}
