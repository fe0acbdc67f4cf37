//! Clober v2 keeps one-sided books (a bid book and an ask book per market)
//! behind a central book manager. All user-facing order flow goes through
//! the controller; read access goes through the book viewer.

use alloy::{providers::DynProvider, sol};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IController {
        struct MakeOrderParams {
            uint192 id;
            int24 tick;
            uint256 quoteAmount;
            bytes hookData;
        }

        struct SpendOrderParams {
            uint192 id;
            uint256 limitPrice;
            uint256 baseAmount;
            uint256 minQuoteAmount;
            bytes hookData;
        }

        function make(
            MakeOrderParams[] calldata paramsList,
            address[] calldata tokensToSettle,
            uint64 deadline
        ) external payable returns (uint256[] memory ids);

        function spend(
            SpendOrderParams[] calldata paramsList,
            address[] calldata tokensToSettle,
            uint64 deadline
        ) external payable;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IBookViewer {
        struct Liquidity {
            int24 tick;
            uint64 depth;
        }

        function getLiquidity(
            uint192 id,
            int24 from,
            uint256 limit
        ) external view returns (Liquidity[] memory);
    }

    #[allow(missing_docs)]
    interface IBookManager {
        event Take(uint192 indexed bookId, address indexed user, int24 tick, uint64 unit);
    }
}

pub type Controller = IController::IControllerInstance<DynProvider>;
pub type BookViewer = IBookViewer::IBookViewerInstance<DynProvider>;
