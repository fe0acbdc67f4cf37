//! The polymorphic gas-estimator abstraction and the plumbing shared by
//! all protocol adapters.

pub mod clober;
pub mod crystal;
pub mod gte;
pub mod kuru;

use {
    crate::{
        error::{Error, Result},
        nodes::forked_node::ForkedNode,
        results::ResultStore,
    },
    alloy::{
        primitives::{Address, U256, address},
        rpc::types::TransactionReceipt,
    },
    contracts::erc20,
    ethrpc::{AlloyProvider, extensions::CallBuilderExt},
};

/// The account benchmark transactions are submitted as. Holds deep
/// balances of every benchmarked token at the pinned fork block and is
/// impersonated by the fork harness, so no key material is involved.
pub const WHALE: Address = address!("FA735CcA8424e4eF30980653bf9015331d9929dB");

/// Stable routing key identifying one logical sub-connection on the shared
/// fork endpoint: the decimal rendering of the adapter name's UTF-8 bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteKey(String);

impl RouteKey {
    /// Adapter names are short identifiers, well under the 32 bytes a
    /// single word can hold.
    pub fn derive(name: &str) -> Self {
        Self(U256::from_be_slice(name.as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The client set of one adapter, exclusively owned by it and never shared
/// across adapters. All three roles point at the same fork, on the
/// adapter's own route:
///
/// - `read` issues stateless queries (including batched multi-reads),
/// - `write` submits transactions as the impersonated [`WHALE`],
/// - `control` drives the fork's cheat API (impersonating further
///   accounts, balances, block production) for adapters that need
///   auxiliary funded signers.
#[derive(Clone, Debug)]
pub struct Connections {
    pub read: AlloyProvider,
    pub write: AlloyProvider,
    pub control: AlloyProvider,
    /// The impersonated account the write connection submits as.
    pub account: Address,
}

impl Connections {
    pub fn new(node: &ForkedNode, route: &RouteKey) -> Self {
        let endpoint = node.endpoint_for(route);
        Self {
            read: ethrpc::provider(&endpoint),
            write: ethrpc::provider(&endpoint),
            control: ethrpc::provider(&endpoint),
            account: WHALE,
        }
    }
}

/// What a cleared book looks like for a given protocol. Protocols disagree
/// on purpose: some drain to literal emptiness, one settles on a canonical
/// synthetic spread, one keeps its book untouched. The baseline is
/// declared by the adapter, never inferred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClearedBaseline {
    /// No resting liquidity on either side.
    Empty,
    /// The fixed spread the contract reports once drained.
    Spread { highest_bid: u64, lowest_ask: u64 },
    /// The book is left as found; clearing is a no-op for this protocol.
    Untouched,
}

/// Identity of one protocol deployment under benchmark. Immutable after
/// construction.
#[derive(Clone, Debug)]
pub struct Identity {
    pub name: &'static str,
    /// The settlement contract allowances are granted to.
    pub contract: Address,
    pub base_token: Address,
    pub quote_token: Address,
}

impl Identity {
    pub fn new(
        name: &'static str,
        contract: Address,
        base_token: Address,
        quote_token: Address,
    ) -> Result<Self> {
        if base_token == quote_token {
            return Err(Error::Setup(format!(
                "{name}: base and quote token must differ"
            )));
        }
        Ok(Self {
            name,
            contract,
            base_token,
            quote_token,
        })
    }

    pub fn route_key(&self) -> RouteKey {
        RouteKey::derive(self.name)
    }

    /// Alias a persisted sample is keyed by.
    pub fn alias(&self, operation: &str, orders: u64) -> String {
        format!("{}-{}-{}", self.name, operation, orders)
    }
}

/// The common benchmark contract every protocol adapter implements. The
/// orchestrator drives these four operations strictly in declaration
/// order and never inspects protocol internals.
#[async_trait::async_trait(?Send)]
pub trait GasEstimator {
    fn identity(&self) -> &Identity;

    fn connections(&self) -> &Connections;

    /// The adapter-declared definition of a cleared book, asserted by
    /// [`GasEstimator::clear_order_book`].
    fn cleared_baseline(&self) -> ClearedBaseline;

    /// Grants unlimited spend allowance for both the base and the quote
    /// token to the protocol's settlement contract. Idempotent:
    /// re-approving to the maximum value is a no-op in effect. Must
    /// complete before any other operation.
    async fn max_approve(&self) -> Result<()> {
        let id = self.identity();
        for token in [id.base_token, id.quote_token] {
            max_approve_token(self.connections(), token, id.contract).await?;
        }
        Ok(())
    }

    /// Aggressively consumes resting liquidity on both sides until the
    /// book reaches [`GasEstimator::cleared_baseline`], then re-reads the
    /// top of book and asserts it. Subsequent gas cost is sensitive to
    /// book depth, so proceeding on an unverified book state is not an
    /// option.
    async fn clear_order_book(&self) -> Result<()>;

    /// Submits exactly `orders` non-crossing limit bids at one price,
    /// derived up front from the current top of book so the first order is
    /// guaranteed to rest. Submissions are strictly sequential: one signer
    /// means serialized nonces, and the placement assertions depend on
    /// prior submissions having landed. Persists the aggregate sample
    /// `sum(gas) / orders` (integer floor).
    async fn place_limit_bids_at_same_price(&self, orders: u64) -> Result<()>;

    /// Sweeps the resting liquidity in one settling transaction (or the
    /// protocol-mandated few) and verifies that state actually changed.
    /// Persists the raw gas of the settling transaction; a sweep models
    /// one operation, not `orders` independent ones.
    async fn take_all_orders(&self, orders: u64) -> Result<()>;
}

/// Shared approval helper composed into every adapter's `max_approve`.
/// Skips the transaction when the unlimited allowance is already in place
/// from an earlier run against the same fork.
pub async fn max_approve_token(
    connections: &Connections,
    token: Address,
    spender: Address,
) -> Result<()> {
    let reader = erc20::Instance::new(token, connections.read.clone());
    if reader.allowance(connections.account, spender).call().await? == U256::MAX {
        tracing::debug!(%token, %spender, "unlimited allowance already granted");
        return Ok(());
    }
    let token = erc20::Instance::new(token, connections.write.clone());
    let receipt = token
        .approve(spender, U256::MAX)
        .from(connections.account)
        .send_and_confirm()
        .await?;
    confirmed(receipt).map(drop)
}

/// Rejects receipts of reverted transactions.
pub fn confirmed(receipt: TransactionReceipt) -> Result<TransactionReceipt> {
    if !receipt.status() {
        return Err(Error::TransactionFailed {
            hash: receipt.transaction_hash,
        });
    }
    Ok(receipt)
}

/// Aggregate sample of a make phase: integer-truncated mean gas per order.
/// Callers go through [`measure_placements`], which rejects `orders == 0`.
pub fn mean_gas(total_gas: u64, orders: u64) -> u64 {
    total_gas / orders
}

/// The sequential submission loop shared by every make phase: exactly
/// `orders` placements, one at a time, each yielding the gas it consumed.
/// Any error aborts the loop and nothing is persisted; on success the
/// floor-mean sample is stored under `alias`.
pub async fn measure_placements<F>(
    results: &ResultStore,
    alias: &str,
    orders: u64,
    mut place: F,
) -> Result<()>
where
    F: AsyncFnMut(u64) -> Result<u64>,
{
    if orders == 0 {
        return Err(Error::Setup("at least one order is required".into()));
    }
    let mut total_gas = 0;
    for bid in 1..=orders {
        total_gas += place(bid).await?;
    }
    results.store(alias, mean_gas(total_gas, orders))
}

/// Scales a whole-unit token amount to base units.
pub fn units(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(decimals))
}

/// Asserts an observed top of book against the adapter's declared
/// baseline, for protocols whose top of book is a price pair.
pub fn ensure_cleared(
    baseline: ClearedBaseline,
    highest_bid: U256,
    lowest_ask: U256,
) -> Result<()> {
    let expected = match baseline {
        ClearedBaseline::Empty => (U256::ZERO, U256::ZERO),
        ClearedBaseline::Spread {
            highest_bid,
            lowest_ask,
        } => (U256::from(highest_bid), U256::from(lowest_ask)),
        ClearedBaseline::Untouched => return Ok(()),
    };
    if (highest_bid, lowest_ask) != expected {
        return Err(Error::post_condition(
            "order book cleared to baseline",
            format!("bid {} / ask {}", expected.0, expected.1),
            format!("bid {highest_bid} / ask {lowest_ask}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::B256};

    #[test]
    fn route_key_is_the_decimal_utf8_rendering_of_the_name() {
        assert_eq!(RouteKey::derive("clober").as_str(), "109317376337266");
    }

    #[test]
    fn route_keys_differ_per_adapter() {
        let keys = ["clober", "crystal", "gte", "kuru"].map(RouteKey::derive);
        for (i, key) in keys.iter().enumerate() {
            for other in &keys[i + 1..] {
                assert_ne!(key, other);
            }
        }
    }

    #[test]
    fn mean_gas_truncates() {
        assert_eq!(mean_gas(1_009, 10), 100);
        assert_eq!(mean_gas(1_000, 10), 100);
        assert_eq!(mean_gas(9, 10), 0);
    }

    #[test]
    fn identity_rejects_equal_tokens() {
        let token = address!("f817257fed379853cDe0fa4F97AB987181B1E5Ea");
        assert!(Identity::new("test", Address::ZERO, token, token).is_err());
    }

    #[test]
    fn alias_names_protocol_operation_and_count() {
        let identity = Identity::new(
            "gte",
            Address::ZERO,
            address!("776401b9bc8aae31a685731b7147d4445fd9fb19"),
            address!("e9b6e75c243b6100ffcb1c66e8f78f96feea727f"),
        )
        .unwrap();
        assert_eq!(identity.alias("make", 10), "gte-make-10");
    }

    #[test]
    fn units_scale_by_decimals() {
        assert_eq!(units(1, 18), U256::from(10u64).pow(U256::from(18)));
        assert_eq!(units(10_000_000, 6), U256::from(10_000_000_000_000u64));
    }

    #[tokio::test]
    async fn reverted_placement_persists_no_partial_sample() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultStore::from(dir.path());

        let mut submitted = 0;
        let err = measure_placements(&results, "crystal-make-10", 10, async |bid| {
            submitted += 1;
            if bid == 5 {
                return Err(Error::TransactionFailed { hash: B256::ZERO });
            }
            Ok(120_000)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::TransactionFailed { .. }));
        // The loop stops at the reverted submission and the partial
        // aggregate never reaches the store.
        assert_eq!(submitted, 5);
        assert!(!dir.path().join("crystal-make-10.json").exists());
    }

    #[tokio::test]
    async fn successful_placements_persist_the_floor_mean() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultStore::from(dir.path());

        measure_placements(&results, "gte-make-4", 4, async |_| Ok(101))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("gte-make-4.json")).unwrap();
        assert!(raw.contains("\"gasUsage\": \"101\""));
    }

    #[tokio::test]
    async fn zero_placements_are_rejected_before_any_submission() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultStore::from(dir.path());

        let err = measure_placements(&results, "gte-make-0", 0, async |_| Ok(1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Setup(_)));
    }

    #[test]
    fn cleared_baseline_is_asserted() {
        let spread = ClearedBaseline::Spread {
            highest_bid: 0,
            lowest_ask: 10_000,
        };
        assert!(ensure_cleared(spread, U256::ZERO, U256::from(10_000)).is_ok());
        assert!(matches!(
            ensure_cleared(spread, U256::from(7), U256::from(10_000)),
            Err(Error::PostCondition { .. })
        ));
        assert!(ensure_cleared(ClearedBaseline::Untouched, U256::from(1), U256::from(2)).is_ok());
    }
}
