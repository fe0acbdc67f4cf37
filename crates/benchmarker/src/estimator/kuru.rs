//! Kuru adapter. The most setup-heavy protocol: trading happens against
//! margin balances held by a central margin account, so construction
//! derives a throwaway signer, funds it with native, base and quote, and
//! deposits margin for both tokens before any phase runs.

use {
    super::{
        ClearedBaseline,
        Connections,
        GasEstimator,
        Identity,
        confirmed,
        measure_placements,
        units,
    },
    crate::{
        error::{Error, Result},
        nodes::forked_node::ForkedNode,
        results::ResultStore,
    },
    alloy::{
        primitives::{Address, U256, address, aliases::U96},
        providers::{Provider, ext::AnvilApi},
        signers::local::PrivateKeySigner,
    },
    contracts::{
        erc20,
        kuru::{MarginAccount, OrderBook, TokenFaucet},
    },
    ethrpc::extensions::CallBuilderExt,
};

const ORDER_BOOK: Address = address!("98026E9F2E27481Ca3152A753B7c6cE74aCb7710");
const MARGIN_ACCOUNT: Address = address!("4B186949F31FCA0aD08497Df9169a6bEbF0e26ef");
const TOKEN_FAUCET: Address = address!("49FDEEe09430dd74d2a7FaB8b5157F9D47BcA87f");
const BASE_TOKEN: Address = address!("0EfeD4D9fB7863ccC7bb392847C08dCd00FE9bE2");
const QUOTE_TOKEN: Address = address!("f817257fed379853cDe0fa4F97AB987181B1E5Ea");

const BASE_DECIMALS: u8 = 18;
const QUOTE_DECIMALS: u8 = 6;

/// Whole-unit funding amounts for the throwaway trader.
const NATIVE_FUNDING: u64 = 1_000;
const QUOTE_FUNDING: u64 = 10_000_000;
const BASE_FUNDING: u64 = 9_000_000;
/// Whole-unit margin deposited per token.
const MARGIN_DEPOSIT: u64 = 100_000;

pub struct Kuru {
    identity: Identity,
    connections: Connections,
    /// Order book bound to the read connection.
    reader: OrderBook,
    /// Order book bound to the trader's own signing connection.
    book: OrderBook,
    /// Scale of the `size` argument of order placement calls; one whole
    /// unit of size equals this many size ticks.
    size_precision: U96,
    results: ResultStore,
}

impl Kuru {
    pub async fn new(node: &ForkedNode, results: ResultStore) -> Result<Self> {
        let identity = Identity::new("kuru", ORDER_BOOK, BASE_TOKEN, QUOTE_TOKEN)?;
        let connections = Connections::new(node, &identity.route_key());

        // Margin balances are account-scoped, so a signer derived fresh
        // for this run keeps the benchmark independent of whatever the
        // whale already has deposited.
        let signer = PrivateKeySigner::random();
        let trader = signer.address();
        let trade_endpoint = node.endpoint_for(&identity.route_key());
        let trade_provider = ethrpc::provider_with_signer(&trade_endpoint, signer);

        // Gas funding through the control connection.
        connections
            .control
            .anvil_set_balance(trader, units(NATIVE_FUNDING, 18))
            .await?;

        // Mint quote token through the faucet, then hand both tokens on
        // to the trader.
        let quote = erc20::Instance::new(identity.quote_token, connections.write.clone());
        let base = erc20::Instance::new(identity.base_token, connections.write.clone());
        confirmed(
            quote
                .approve(TOKEN_FAUCET, U256::MAX)
                .from(connections.account)
                .send_and_confirm()
                .await?,
        )?;
        let faucet = TokenFaucet::new(TOKEN_FAUCET, connections.write.clone());
        confirmed(
            faucet
                .createWithUSDC(units(QUOTE_FUNDING, QUOTE_DECIMALS))
                .from(connections.account)
                .send_and_confirm()
                .await?,
        )?;
        confirmed(
            quote
                .transfer(trader, units(QUOTE_FUNDING, QUOTE_DECIMALS))
                .from(connections.account)
                .send_and_confirm()
                .await?,
        )?;
        confirmed(
            base.transfer(trader, units(BASE_FUNDING, BASE_DECIMALS))
                .from(connections.account)
                .send_and_confirm()
                .await?,
        )?;

        // Read the funding back in one batched call; continuing with an
        // unfunded trader would only produce confusing reverts later.
        let base_reader = erc20::Instance::new(identity.base_token, connections.read.clone());
        let quote_reader = erc20::Instance::new(identity.quote_token, connections.read.clone());
        let (base_balance, quote_balance) = connections
            .read
            .multicall()
            .add(base_reader.balanceOf(trader))
            .add(quote_reader.balanceOf(trader))
            .aggregate()
            .await?;
        if base_balance.is_zero() {
            return Err(Error::Setup("kuru trader holds no base token".into()));
        }
        if quote_balance.is_zero() {
            return Err(Error::Setup("kuru trader holds no quote token".into()));
        }

        let reader = OrderBook::new(ORDER_BOOK, connections.read.clone());
        let params = reader.getMarketParams().call().await?;

        // The margin account pulls deposits with transferFrom, so the
        // trader grants it an unlimited allowance for both tokens first.
        let quote_trader = erc20::Instance::new(identity.quote_token, trade_provider.clone());
        let base_trader = erc20::Instance::new(identity.base_token, trade_provider.clone());
        confirmed(
            quote_trader
                .approve(MARGIN_ACCOUNT, U256::MAX)
                .send_and_confirm()
                .await?,
        )?;
        confirmed(
            base_trader
                .approve(MARGIN_ACCOUNT, U256::MAX)
                .send_and_confirm()
                .await?,
        )?;

        // Margin for both sides of the book.
        let margin = MarginAccount::new(MARGIN_ACCOUNT, trade_provider.clone());
        confirmed(
            margin
                .deposit(
                    trader,
                    identity.quote_token,
                    units(MARGIN_DEPOSIT, QUOTE_DECIMALS),
                )
                .send_and_confirm()
                .await?,
        )?;
        confirmed(
            margin
                .deposit(
                    trader,
                    identity.base_token,
                    units(MARGIN_DEPOSIT, BASE_DECIMALS),
                )
                .send_and_confirm()
                .await?,
        )?;

        tracing::info!(%trader, "initialized throwaway trader");
        Ok(Self {
            identity,
            connections,
            reader,
            book: OrderBook::new(ORDER_BOOK, trade_provider),
            size_precision: params.sizePrecision,
            results,
        })
    }

    async fn best_bid_ask(&self) -> Result<(U256, U256)> {
        let tob = self.reader.bestBidAsk().call().await?;
        Ok((tob.bestBid, tob.bestAsk))
    }
}

/// Midpoint of the spread, in the contract's own price units.
fn mid_price(best_bid: U256, best_ask: U256) -> U256 {
    (best_bid + best_ask) / U256::from(2)
}

#[async_trait::async_trait(?Send)]
impl GasEstimator for Kuru {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn connections(&self) -> &Connections {
        &self.connections
    }

    fn cleared_baseline(&self) -> ClearedBaseline {
        ClearedBaseline::Untouched
    }

    async fn clear_order_book(&self) -> Result<()> {
        // The shared market stays liquid by design: bids are priced off
        // the live mid price, so draining the book is not part of this
        // protocol's baseline.
        tracing::info!("clear skipped; baseline leaves the book untouched");
        Ok(())
    }

    async fn place_limit_bids_at_same_price(&self, orders: u64) -> Result<()> {
        let (best_bid, best_ask) = self.best_bid_ask().await?;
        if best_bid.is_zero() || best_ask.is_zero() {
            return Err(Error::post_condition(
                "two-sided book to derive a mid price from",
                "nonzero best bid and ask",
                format!("bid {best_bid} / ask {best_ask}"),
            ));
        }
        let mid = mid_price(best_bid, best_ask);
        let price = u32::try_from(mid)
            .map_err(|_| Error::Setup(format!("kuru mid price {mid} exceeds the price range")))?;
        tracing::info!(%best_bid, %best_ask, price, orders, "placing limit bids at mid price");

        measure_placements(
            &self.results,
            &self.identity.alias("make", orders),
            orders,
            async |bid| {
                let receipt = confirmed(
                    self.book
                        .addBuyOrder(price, self.size_precision, true)
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
        let (bid_before, _) = self.best_bid_ask().await?;
        if bid_before.is_zero() {
            return Err(Error::post_condition(
                "liquidity available to take",
                "resting bid liquidity",
                "empty bid side",
            ));
        }

        // Sell exactly what the make phase rested so the sweep walks all
        // of it.
        let size = U96::from(orders) * self.size_precision;
        let receipt = confirmed(
            self.book
                .placeAndExecuteMarketSell(size, U256::ZERO, false, true)
                .send_and_confirm()
                .await?,
        )?;

        let (bid_after, _) = self.best_bid_ask().await?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_price_is_the_spread_midpoint() {
        assert_eq!(
            mid_price(U256::from(1_000), U256::from(1_200)),
            U256::from(1_100)
        );
        // Integer division truncates.
        assert_eq!(mid_price(U256::from(3), U256::from(4)), U256::from(3));
    }
}
