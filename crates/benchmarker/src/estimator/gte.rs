//! GTE adapter. Calls the market's `ICLOB` interface directly with
//! manually assembled tuple arguments. The base token wraps the native
//! token, so funding the maker side is a plain value transfer to the
//! token contract.

use {
    super::{
        ClearedBaseline,
        Connections,
        GasEstimator,
        Identity,
        confirmed,
        ensure_cleared,
        measure_placements,
        units,
    },
    crate::{
        error::{Error, Result},
        nodes::forked_node::ForkedNode,
        results::ResultStore,
    },
    alloy::{
        network::TransactionBuilder,
        primitives::{Address, U256, address, aliases::U96},
        providers::Provider,
        rpc::types::{TransactionReceipt, TransactionRequest},
    },
    contracts::gte::{self, ICLOB, side},
    ethrpc::extensions::CallBuilderExt,
};

const ROUTER: Address = address!("D7310f8A0D569Dd0803D28BB29f4E0A471fA84F6");
const MARKET: Address = address!("5ca9f32d4ce7cc0f782213c446c2ae14b754a623");
const BASE_TOKEN: Address = address!("776401b9bc8aae31a685731b7147d4445fd9fb19");
const QUOTE_TOKEN: Address = address!("e9b6e75c243b6100ffcb1c66e8f78f96feea727f");

const IMMEDIATE_OR_CANCEL: u8 = 0;
const FILL_OR_KILL: u8 = 1;
const POST_ONLY: u8 = 1;
const INSTANT_SETTLEMENT: u8 = 0;

/// Placed above the best bid by a fixed increment so the bids define a
/// fresh best price that can be asserted after every placement.
const PRICE_BUMP: u64 = 1_000_000_000_000_000;
/// Base amount per resting bid.
const BID_AMOUNT_BASE: u64 = 100_000_000;

/// Sweeps walk long stretches of the book; the gas limit is set
/// explicitly because estimation reverts once the sweep would empty a
/// side.
const CLEAR_GAS_LIMIT: u64 = 16_000_000;
const TAKE_GAS_LIMIT: u64 = 8_000_000;

pub struct Gte {
    identity: Identity,
    connections: Connections,
    market: gte::Instance,
    reader: gte::Instance,
    results: ResultStore,
}

impl Gte {
    pub fn new(node: &ForkedNode, results: ResultStore) -> Result<Self> {
        let identity = Identity::new("gte", ROUTER, BASE_TOKEN, QUOTE_TOKEN)?;
        let connections = Connections::new(node, &identity.route_key());
        let market = gte::ICLOB::new(MARKET, connections.write.clone());
        let reader = gte::ICLOB::new(MARKET, connections.read.clone());
        Ok(Self {
            identity,
            connections,
            market,
            reader,
            results,
        })
    }

    /// Mints wrapped-native base token by transferring value into the
    /// token contract.
    async fn wrap_native(&self, amount: U256) -> Result<()> {
        let tx = TransactionRequest::default()
            .with_from(self.connections.account)
            .with_to(self.identity.base_token)
            .with_value(amount);
        let receipt = self
            .connections
            .write
            .send_transaction(tx)
            .await?
            .get_receipt()
            .await?;
        confirmed(receipt).map(drop)
    }

    async fn best_bid(&self) -> Result<U256> {
        Ok(self.reader.getTOB().call().await?.maxBid)
    }

    async fn fill(
        &self,
        amount: U256,
        price_limit: U256,
        order_side: u8,
        amount_is_base: bool,
        order_type: u8,
        gas_limit: u64,
    ) -> Result<TransactionReceipt> {
        let args = ICLOB::PostFillOrderArgs {
            amount,
            priceLimit: price_limit,
            side: order_side,
            amountIsBase: amount_is_base,
            fillOrderType: order_type,
            settlement: INSTANT_SETTLEMENT,
        };
        let receipt = self
            .market
            .postFillOrder(self.connections.account, args)
            .from(self.connections.account)
            .gas(gas_limit)
            .send_and_confirm()
            .await?;
        confirmed(receipt)
    }
}

#[async_trait::async_trait(?Send)]
impl GasEstimator for Gte {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn connections(&self) -> &Connections {
        &self.connections
    }

    fn cleared_baseline(&self) -> ClearedBaseline {
        ClearedBaseline::Empty
    }

    async fn clear_order_book(&self) -> Result<()> {
        self.wrap_native(units(20_000_000, 18)).await?;

        // Sell through the bids, then buy out the asks.
        self.fill(
            units(10_000_000, 18),
            U256::ZERO,
            side::SELL,
            true,
            IMMEDIATE_OR_CANCEL,
            CLEAR_GAS_LIMIT,
        )
        .await?;
        self.fill(
            units(10_000_000, 18),
            U256::MAX,
            side::BUY,
            false,
            IMMEDIATE_OR_CANCEL,
            CLEAR_GAS_LIMIT,
        )
        .await?;

        let tob = self.reader.getTOB().call().await?;
        ensure_cleared(self.cleared_baseline(), tob.maxBid, tob.minAsk)?;
        tracing::info!("order book cleared");
        Ok(())
    }

    async fn place_limit_bids_at_same_price(&self, orders: u64) -> Result<()> {
        self.wrap_native(units(10_000, 18)).await?;

        // The target price is derived once up front; every subsequent
        // placement is asserted against it.
        let target = self.best_bid().await? + U256::from(PRICE_BUMP);
        tracing::info!(%target, orders, "placing limit bids");

        measure_placements(
            &self.results,
            &self.identity.alias("make", orders),
            orders,
            async |bid| {
                let args = ICLOB::PostLimitOrderArgs {
                    amountInBase: U256::from(BID_AMOUNT_BASE),
                    price: target,
                    cancelTimestamp: U256::ZERO,
                    side: side::BUY,
                    clientOrderId: U96::ZERO,
                    limitOrderType: POST_ONLY,
                    settlement: INSTANT_SETTLEMENT,
                };
                let receipt = confirmed(
                    self.market
                        .postLimitOrder(self.connections.account, args)
                        .from(self.connections.account)
                        .send_and_confirm()
                        .await?,
                )?;
                tracing::debug!(bid, orders, hash = ?receipt.transaction_hash, "placed limit bid");

                let best_bid = self.best_bid().await?;
                if best_bid != target {
                    return Err(Error::post_condition(
                        "limit bid resting at the target price",
                        format!("best bid {target}"),
                        format!("best bid {best_bid}"),
                    ));
                }
                Ok(receipt.gas_used)
            },
        )
        .await
    }

    async fn take_all_orders(&self, orders: u64) -> Result<()> {
        let bid_before = self.best_bid().await?;
        if bid_before.is_zero() {
            return Err(Error::post_condition(
                "liquidity available to take",
                "resting bid liquidity",
                "empty bid side",
            ));
        }

        let receipt = self
            .fill(
                units(1, 18),
                bid_before,
                side::SELL,
                true,
                FILL_OR_KILL,
                TAKE_GAS_LIMIT,
            )
            .await?;

        let bid_after = self.best_bid().await?;
        if bid_after == bid_before {
            return Err(Error::post_condition(
                "top of book changed by sweep",
                format!("best bid != {bid_before}"),
                format!("best bid {bid_after}"),
            ));
        }

        self.results
            .store(&self.identity.alias("take", orders), receipt.gas_used)
    }
}
