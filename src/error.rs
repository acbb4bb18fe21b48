// src/error.rs
//
// Typed failures raised by the SDK itself. Contract and transport failures are not wrapped
// here: they travel through `anyhow` untouched so callers see the provider's own message.

use crate::types::pair::PoolType;
use ethers::types::Address;

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Pool adapter not found for pool type {0:?}")]
    AdapterNotFound(PoolType),
    #[error("Invalid swap type for pool {0:?}")]
    InvalidSwapType(Address),
    #[error("Unknown pool type id {0}")]
    UnknownPoolType(u8),
    #[error("Pool list is empty")]
    EmptyPoolList,
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Minimum return amount is zero")]
    ZeroMinReturn,
    #[error("Invalid route: {0}")]
    InvalidRoute(String),
    #[error("Chain {0} is not configured")]
    UnsupportedChain(u64),
}
