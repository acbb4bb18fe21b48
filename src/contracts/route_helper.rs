use ethers::prelude::abigen;

// Struct outputs come back from the bindings as plain nested tuples.
abigen!(
    RouteHelper,
    r#"[
        struct Pair { address token0; address token1; address poolAddr; uint8 poolType; uint24 fee; uint8 swapType; }
        struct ResAmount { uint256 bestAmount; uint256 midPrice; }
        struct OneHop { Pair[] pools; uint256[] weights; }
        struct SplitPathInfo { address[] tokens; OneHop[] oneHops; uint256 finalAmountOut; bool isValid; }
        function querySingleRoute(address fromToken, address toToken, uint256 amount, uint256 flag) external view returns (ResAmount resAmount, address[] bestPath, Pair[] bestPoolPath)
        function queryDirectRoute(address fromToken, address toToken, uint256 amount, uint256 flag) external view returns (ResAmount resAmount, address[] bestPath, Pair[] bestPoolPath)
        function querySplitRoute(address fromToken, address toToken, address midToken, uint256 amount, uint256 flag, bool isDirect) external view returns (ResAmount resAmount, SplitPathInfo bestPathInfo)
    ]"#
);
