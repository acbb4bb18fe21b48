pub mod conversions;
pub mod pair;
pub mod route;

pub use pair::{Pair, PoolType, SwapType};
pub use route::{
    OneHop, RawSingleRoute, RawSplitRoute, SingleRouteResult, SplitPathInfo, SplitRouteResult,
};
