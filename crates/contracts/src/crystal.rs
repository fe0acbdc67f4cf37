//! Crystal exposes the whole market as a single contract with raw
//! positional arguments. Accounts must be registered once before they can
//! place resting orders.

use alloy::{providers::DynProvider, sol};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IOrderBook {
        function registerUser(address caller) external returns (uint256 _latestUserId);

        function limitOrder(
            bool isBuy,
            uint256 price,
            uint256 size,
            address from,
            address owner
        ) external returns (uint256 id);

        function marketOrder(
            bool isBuy,
            bool isExactInput,
            bool isFromCaller,
            bool isToCaller,
            uint256 orderType,
            uint256 size,
            uint256 worstPrice,
            address caller,
            address referrer
        ) external returns (uint256 amountIn, uint256 amountOut, uint256 id);

        function lowestAsk() external view returns (uint256 lowestAsk);

        function highestBid() external view returns (uint256 highestBid);
    }
}

pub type Instance = IOrderBook::IOrderBookInstance<DynProvider>;
