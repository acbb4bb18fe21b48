use anyhow::Result;
use ethers::abi::{parse_abi, Abi, Token};
use ethers::types::Bytes;

/// Settlement entry points. Only used to encode call data, never called through a provider.
const AGGREGATOR_ABI: &[&str] = &[
    "function mixSwap(address fromToken, address toToken, uint256 fromTokenAmount, uint256 expReturnAmount, uint256 minReturnAmount, address[] mixAdapters, address[] mixPairs, address[] assetTo, uint256 directions, bytes[] moreInfos, bytes feeData, uint256 deadLine) external payable returns (uint256)",
    "function multiSwap(uint256 fromTokenAmount, uint256 expReturnAmount, uint256 minReturnAmount, uint256[] splitNumber, address[] midToken, address[] assetFrom, bytes[] sequence, bytes feeData, uint256 deadLine) external payable returns (uint256)",
    "function approve(address spender, uint256 amount) external returns (bool)",
];

pub fn aggregator_abi() -> Result<Abi> {
    Ok(parse_abi(AGGREGATOR_ABI)?)
}

/// Selector plus ABI-encoded arguments for one of the functions above.
pub fn encode_call(name: &str, args: &[Token]) -> Result<Bytes> {
    let abi = aggregator_abi()?;
    let function = abi.function(name)?;
    Ok(Bytes::from(function.encode_input(args)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Address, U256};

    #[test]
    fn test_approve_matches_erc20_selector() {
        let data = encode_call(
            "approve",
            &[
                Token::Address(Address::from_low_u64_be(1)),
                Token::Uint(U256::MAX),
            ],
        )
        .unwrap();
        assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn test_unknown_function_is_an_error() {
        assert!(encode_call("sweep", &[]).is_err());
    }

    #[test]
    fn test_argument_mismatch_is_an_error() {
        assert!(encode_call("approve", &[Token::Bool(true)]).is_err());
    }
}
