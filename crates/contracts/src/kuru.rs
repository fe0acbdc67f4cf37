//! Kuru settles against a central margin account: traders deposit both
//! tokens up front and the order book contract trades against those
//! balances. Prices and sizes are fixed-point integers scaled by the
//! market's own precision parameters.

use alloy::{providers::DynProvider, sol};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IOrderBook {
        function getMarketParams()
            external
            view
            returns (
                uint32 pricePrecision,
                uint96 sizePrecision,
                address baseAsset,
                uint256 baseAssetDecimals,
                address quoteAsset,
                uint256 quoteAssetDecimals
            );

        function bestBidAsk() external view returns (uint256 bestBid, uint256 bestAsk);

        function addBuyOrder(uint32 price, uint96 size, bool postOnly) external;

        function placeAndExecuteMarketSell(
            uint96 size,
            uint256 minAmountOut,
            bool isMargin,
            bool isFillOrKill
        ) external returns (uint256 amountOut);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IMarginAccount {
        function deposit(address user, address token, uint256 amount) external payable;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ITokenFaucet {
        function createWithUSDC(uint256 tokenAmount) external;
    }
}

pub type OrderBook = IOrderBook::IOrderBookInstance<DynProvider>;
pub type MarginAccount = IMarginAccount::IMarginAccountInstance<DynProvider>;
pub type TokenFaucet = ITokenFaucet::ITokenFaucetInstance<DynProvider>;
