use ethers::prelude::abigen;

abigen!(
    LiquidityConfig,
    r#"[
        struct Pair { address token0; address token1; address poolAddr; uint8 poolType; uint24 fee; uint8 swapType; }
        function getPoolsWithFlag(address token0, address token1, uint256 flag) external view returns (Pair[] pools)
        function getMidPrices(address[] pools, uint8[] poolTypes, bool isBuy) external view returns (uint256[] prices, uint256[] token0Balances, uint256[] token1Balances)
        function getAmountsOut(address pool, uint8 poolType, bool isToken0, uint256[] amountsIn) external view returns (uint256[])
        function getPoolAdapter(uint8 poolType) external view returns (address)
    ]"#
);
