//! Clober adapter. Order flow is mediated by the protocol's controller
//! contract; the bid and ask sides are separate one-sided books read
//! through the book viewer.

use {
    super::{
        ClearedBaseline,
        Connections,
        GasEstimator,
        Identity,
        confirmed,
        measure_placements,
    },
    crate::{
        error::{Error, Result},
        nodes::forked_node::ForkedNode,
        results::ResultStore,
    },
    alloy::{
        primitives::{
            Address,
            Bytes,
            U256,
            address,
            aliases::{I24, U192},
        },
        rpc::types::TransactionReceipt,
    },
    contracts::clober::{BookViewer, Controller, IBookManager, IBookViewer, IController},
    ethrpc::extensions::CallBuilderExt,
};

const CONTROLLER: Address = address!("08feDaACe14EB141E51282441b05182519D853D1");
const BOOK_VIEWER: Address = address!("7F95Ca8F0d559bf03e7A2A167fEc2c8e4cCa2a5D");
const BASE_TOKEN: Address = address!("f817257fed379853cDe0fa4F97AB987181B1E5Ea");
const QUOTE_TOKEN: Address = address!("88b8E2161DEDC77EF4ab7585569D2415a1C1055D");

/// Book identifiers of the benchmarked market. Clober books are one-sided;
/// the bid book quotes the base token in quote units, the ask book the
/// other way around.
const BID_BOOK: u128 = 0x1ff4_b19c_3379_31f2_1f52_a302_892c_d708;
const ASK_BOOK: u128 = 0x8c3a_77e1_05d2_4f0b_66ab_90de_12c4_fb3e;

/// Quote spent per resting bid, in quote token base units.
const BID_QUOTE_AMOUNT: u64 = 1_000_000;
/// Input budget for one clearing sweep, deliberately larger than any depth
/// resting at the pinned fork block.
const SWEEP_AMOUNT: u64 = 1_000_000_000_000;
/// Tick for resting bids when the ask side is empty, which is the state
/// `clear_order_book` leaves behind. Deep enough that the bids can never
/// cross anything placed later.
const EMPTY_BOOK_BID_TICK: i32 = -80_000;

/// Orders submitted through the controller never expire within a run.
const NO_DEADLINE: u64 = u64::MAX;

pub struct Clober {
    identity: Identity,
    connections: Connections,
    controller: Controller,
    viewer: BookViewer,
    results: ResultStore,
}

impl Clober {
    pub fn new(node: &ForkedNode, results: ResultStore) -> Result<Self> {
        let identity = Identity::new("clober", CONTROLLER, BASE_TOKEN, QUOTE_TOKEN)?;
        let connections = Connections::new(node, &identity.route_key());
        let controller = Controller::new(CONTROLLER, connections.write.clone());
        let viewer = BookViewer::new(BOOK_VIEWER, connections.read.clone());
        Ok(Self {
            identity,
            connections,
            controller,
            viewer,
            results,
        })
    }

    async fn book_liquidity(&self, book: U192) -> Result<Vec<IBookViewer::Liquidity>> {
        Ok(self
            .viewer
            .getLiquidity(book, I24::MIN, U256::from(10))
            .call()
            .await?)
    }

    /// Market-style sweep consuming resting orders of one book, spending
    /// up to the given input budget.
    async fn sweep(&self, book: U192, amount: U256) -> Result<TransactionReceipt> {
        let params = IController::SpendOrderParams {
            id: book,
            limitPrice: U256::ZERO,
            baseAmount: amount,
            minQuoteAmount: U256::ZERO,
            hookData: Bytes::new(),
        };
        let receipt = self
            .controller
            .spend(
                vec![params],
                vec![self.identity.base_token, self.identity.quote_token],
                NO_DEADLINE,
            )
            .from(self.connections.account)
            .send_and_confirm()
            .await?;
        confirmed(receipt)
    }
}

/// Price for the resting bids: one tick below the best ask so the first
/// order rests instead of filling.
fn resting_bid_tick(asks: &[IBookViewer::Liquidity]) -> I24 {
    asks.first()
        .map(|level| level.tick - I24::ONE)
        .unwrap_or_else(|| I24::try_from(EMPTY_BOOK_BID_TICK).expect("constant fits in 24 bits"))
}

#[async_trait::async_trait(?Send)]
impl GasEstimator for Clober {
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
        self.sweep(U192::from(BID_BOOK), U256::from(SWEEP_AMOUNT))
            .await?;
        self.sweep(U192::from(ASK_BOOK), U256::from(SWEEP_AMOUNT))
            .await?;

        let bids = self.book_liquidity(U192::from(BID_BOOK)).await?;
        let asks = self.book_liquidity(U192::from(ASK_BOOK)).await?;
        if !bids.is_empty() || !asks.is_empty() {
            return Err(Error::post_condition(
                "order book cleared to baseline",
                "no resting liquidity",
                format!("{} bid / {} ask levels", bids.len(), asks.len()),
            ));
        }
        tracing::info!("order book cleared");
        Ok(())
    }

    async fn place_limit_bids_at_same_price(&self, orders: u64) -> Result<()> {
        let asks = self.book_liquidity(U192::from(ASK_BOOK)).await?;
        let tick = resting_bid_tick(&asks);
        tracing::info!(%tick, orders, "placing limit bids");

        measure_placements(
            &self.results,
            &self.identity.alias("make", orders),
            orders,
            async |bid| {
                let params = IController::MakeOrderParams {
                    id: U192::from(BID_BOOK),
                    tick,
                    quoteAmount: U256::from(BID_QUOTE_AMOUNT),
                    hookData: Bytes::new(),
                };
                let receipt = confirmed(
                    self.controller
                        .make(vec![params], vec![self.identity.quote_token], NO_DEADLINE)
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
        let bids = self.book_liquidity(U192::from(BID_BOOK)).await?;
        if bids.is_empty() {
            return Err(Error::post_condition(
                "liquidity available to take",
                "resting bid liquidity",
                "empty bid book",
            ));
        }

        let receipt = self
            .sweep(U192::from(BID_BOOK), U256::from(SWEEP_AMOUNT))
            .await?;

        // The make phase rested everything on one price level, so the
        // sweep must settle in exactly one fill event.
        let fills = receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.log_decode::<IBookManager::Take>().is_ok())
            .count();
        if fills != 1 {
            return Err(Error::post_condition(
                "orders taken in one fill",
                "1 fill event",
                format!("{fills} fill events"),
            ));
        }

        self.results
            .store(&self.identity.alias("take", orders), receipt.gas_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resting_bid_price_sits_below_the_best_ask() {
        let asks = vec![IBookViewer::Liquidity {
            tick: I24::try_from(1_234).unwrap(),
            depth: 10,
        }];
        assert_eq!(resting_bid_tick(&asks), I24::try_from(1_233).unwrap());
    }

    #[test]
    fn resting_bid_price_falls_back_on_an_empty_ask_side() {
        assert_eq!(
            resting_bid_tick(&[]),
            I24::try_from(EMPTY_BOOK_BID_TICK).unwrap()
        );
    }
}
