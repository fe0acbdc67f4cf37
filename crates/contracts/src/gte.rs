//! GTE markets implement the `ICLOB` interface: limit and fill orders are
//! posted with tuple arguments and the top of book is a single view call.

use alloy::{providers::DynProvider, sol};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ICLOB {
        struct PostLimitOrderArgs {
            uint256 amountInBase;
            uint256 price;
            uint256 cancelTimestamp;
            uint8 side;
            uint96 clientOrderId;
            uint8 limitOrderType;
            uint8 settlement;
        }

        struct PostLimitOrderResult {
            address account;
            uint256 orderId;
            uint256 amountPostedInBase;
            int256 quoteTokenAmountTraded;
            int256 baseTokenAmountTraded;
            uint256 takerFee;
        }

        struct PostFillOrderArgs {
            uint256 amount;
            uint256 priceLimit;
            uint8 side;
            bool amountIsBase;
            uint8 fillOrderType;
            uint8 settlement;
        }

        struct PostFillOrderResult {
            address account;
            uint256 orderId;
            int256 quoteTokenAmountTraded;
            int256 baseTokenAmountTraded;
            uint256 takerFee;
        }

        function postLimitOrder(
            address account,
            PostLimitOrderArgs calldata args
        ) external returns (PostLimitOrderResult memory);

        function postFillOrder(
            address account,
            PostFillOrderArgs calldata args
        ) external returns (PostFillOrderResult memory);

        function getTOB() external view returns (uint256 maxBid, uint256 minAsk);
    }
}

/// `side` values for order posting.
pub mod side {
    pub const BUY: u8 = 0;
    pub const SELL: u8 = 1;
}

pub type Instance = ICLOB::ICLOBInstance<DynProvider>;
