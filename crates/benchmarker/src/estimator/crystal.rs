//! Crystal adapter. The whole market is one contract taking raw
//! positional arguments; draining it leaves a canonical synthetic spread
//! rather than an empty book.

use {
    super::{
        ClearedBaseline,
        Connections,
        GasEstimator,
        Identity,
        confirmed,
        ensure_cleared,
        measure_placements,
    },
    crate::{
        error::{Error, Result},
        nodes::forked_node::ForkedNode,
        results::ResultStore,
    },
    alloy::{
        primitives::{Address, U256, address},
        providers::Provider,
        rpc::types::TransactionReceipt,
    },
    contracts::crystal,
    ethrpc::extensions::CallBuilderExt,
};

const ORDER_BOOK: Address = address!("CF16582dC82c4C17fA5b54966ee67b74FD715fB5");
const BASE_TOKEN: Address = address!("88b8E2161DEDC77EF4ab7585569D2415a1C1055D");
const QUOTE_TOKEN: Address = address!("f817257fed379853cDe0fa4F97AB987181B1E5Ea");

/// Market order type consuming resting liquidity until the size budget is
/// exhausted.
const SWEEP_ORDER_TYPE: u64 = 2;
/// Sweep size budget: one million quote units at 6 decimals.
const SWEEP_SIZE: u64 = 1_000_000_000_000;
/// Sweeps walk the whole book in one transaction, so the estimate is set
/// explicitly instead of letting the node guess.
const SWEEP_GAS_LIMIT: u64 = 10_000_000;

/// Resting bid placement, in the contract's own price and size units.
const BID_PRICE: u64 = 1_000;
const BID_SIZE: u64 = 1_050_000;

pub struct Crystal {
    identity: Identity,
    connections: Connections,
    /// Instance bound to the write connection for submissions.
    book: crystal::Instance,
    /// Instance bound to the read connection for top-of-book queries.
    reader: crystal::Instance,
    results: ResultStore,
}

impl Crystal {
    pub fn new(node: &ForkedNode, results: ResultStore) -> Result<Self> {
        let identity = Identity::new("crystal", ORDER_BOOK, BASE_TOKEN, QUOTE_TOKEN)?;
        let connections = Connections::new(node, &identity.route_key());
        let book = crystal::IOrderBook::new(ORDER_BOOK, connections.write.clone());
        let reader = crystal::IOrderBook::new(ORDER_BOOK, connections.read.clone());
        Ok(Self {
            identity,
            connections,
            book,
            reader,
            results,
        })
    }

    /// Both sides of the top of book in one batched read.
    async fn top_of_book(&self) -> Result<(U256, U256)> {
        let (highest_bid, lowest_ask) = self
            .connections
            .read
            .multicall()
            .add(self.reader.highestBid())
            .add(self.reader.lowestAsk())
            .aggregate()
            .await?;
        Ok((highest_bid, lowest_ask))
    }

    async fn sweep(&self, buy: bool, worst_price: U256) -> Result<TransactionReceipt> {
        let receipt = self
            .book
            .marketOrder(
                buy,
                true,  // isExactInput
                false, // isFromCaller
                false, // isToCaller
                U256::from(SWEEP_ORDER_TYPE),
                U256::from(SWEEP_SIZE),
                worst_price,
                self.connections.account,
                self.connections.account,
            )
            .from(self.connections.account)
            .gas(SWEEP_GAS_LIMIT)
            .send_and_confirm()
            .await?;
        confirmed(receipt)
    }
}

#[async_trait::async_trait(?Send)]
impl GasEstimator for Crystal {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn connections(&self) -> &Connections {
        &self.connections
    }

    fn cleared_baseline(&self) -> ClearedBaseline {
        ClearedBaseline::Spread {
            highest_bid: 0,
            lowest_ask: 10_000,
        }
    }

    async fn clear_order_book(&self) -> Result<()> {
        // Sell into the bids, then buy out the asks.
        self.sweep(false, U256::ZERO).await?;
        self.sweep(true, U256::MAX).await?;

        let (highest_bid, lowest_ask) = self.top_of_book().await?;
        ensure_cleared(self.cleared_baseline(), highest_bid, lowest_ask)?;
        tracing::info!("order book cleared");
        Ok(())
    }

    async fn place_limit_bids_at_same_price(&self, orders: u64) -> Result<()> {
        // Registration is a prerequisite for resting orders and a no-op
        // for accounts that already registered on a previous run.
        confirmed(
            self.book
                .registerUser(self.connections.account)
                .from(self.connections.account)
                .send_and_confirm()
                .await?,
        )?;

        tracing::info!(price = BID_PRICE, orders, "placing limit bids");
        measure_placements(
            &self.results,
            &self.identity.alias("make", orders),
            orders,
            async |bid| {
                let receipt = confirmed(
                    self.book
                        .limitOrder(
                            true,
                            U256::from(BID_PRICE),
                            U256::from(BID_SIZE),
                            self.connections.account,
                            self.connections.account,
                        )
                        .from(self.connections.account)
                        .send_and_confirm()
                        .await?,
                )?;
                tracing::debug!(bid, orders, hash = ?receipt.transaction_hash, "placed limit bid");
                Ok(receipt.gas_used)
            },
        )
        .await
    }

    async fn take_all_orders(&self, orders: u64) -> Result<()> {
        let (bid_before, _) = self.top_of_book().await?;
        if bid_before.is_zero() {
            return Err(Error::post_condition(
                "liquidity available to take",
                "resting bid liquidity",
                "empty bid side",
            ));
        }

        let receipt = self.sweep(false, U256::ZERO).await?;

        let (bid_after, _) = self.top_of_book().await?;
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
