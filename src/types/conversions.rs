use ethers::types::Address;
use std::cmp::Ordering;
use std::str::FromStr;

/// Sentinel the aggregator contract uses for the chain's native asset
pub const ETH_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

pub fn eth_address() -> Address {
    Address::repeat_byte(0xee)
}

/// Native asset given either as the zero address or the ETH sentinel
pub fn is_native(token: Address) -> bool {
    token.is_zero() || token == eth_address()
}

// Para addresses
pub fn address_to_string(addr: Address) -> String {
    format!("{:?}", addr).to_lowercase()
}

pub fn string_to_address(s: &str) -> Result<Address, ConversionError> {
    Address::from_str(s.trim()).map_err(|e| ConversionError::InvalidAddress(e.to_string()))
}

/// Orders two addresses the way the pools order token0/token1. Byte order of the parsed
/// address is the order of its lowercase hex form, so checksum casing never matters.
pub fn compare_addresses(a: Address, b: Address) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

/// Returns `(token0, token1)` for an unordered token pair.
pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    match compare_addresses(a, b) {
        Ordering::Greater => (b, a),
        _ => (a, b),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eth_sentinel_matches_literal() {
        assert_eq!(string_to_address(ETH_ADDRESS).unwrap(), eth_address());
        assert!(is_native(Address::zero()));
        assert!(is_native(eth_address()));
        assert!(!is_native(Address::from_low_u64_be(1)));
    }

    #[test]
    fn test_ordering_ignores_checksum_case() {
        let upper = string_to_address("0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48").unwrap();
        let lower = string_to_address("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap();
        assert_eq!(compare_addresses(upper, lower), Ordering::Less);
        assert_eq!(
            address_to_string(upper) < address_to_string(lower),
            compare_addresses(upper, lower) == Ordering::Less
        );
        assert_eq!(sort_tokens(lower, upper), (upper, lower));
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            string_to_address("0x1234"),
            Err(ConversionError::InvalidAddress(_))
        ));
    }
}
