use ethers::prelude::abigen;

abigen!(
    PoolAdapter,
    r#"[
        function querySell(address fromToken, uint256 amount, address pool) external view returns (address, uint256)
        function getMidPriceAndBalances(address pool, bool isBuy) external view returns (uint256, uint256, uint256)
    ]"#
);
