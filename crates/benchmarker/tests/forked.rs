//! Benchmarks against a real fork of the upstream network. These tests
//! spawn anvil and talk to deployed contracts, so they are ignored by
//! default; run them with a reachable upstream RPC:
//!
//! ```text
//! FORK_URL_MONAD=<rpc url> cargo test -p benchmarker -- --ignored
//! ```

use {
    benchmarker::{
        estimator::{GasEstimator, clober::Clober, crystal::Crystal, gte::Gte, kuru::Kuru},
        nodes::forked_node::{ForkConfig, ForkedNode},
        results::{GasRecord, ResultStore},
    },
    url::Url,
};

const FORK_BLOCK: u64 = 26608965;

fn fork_config(port: u16) -> ForkConfig {
    let fork_url: Url = std::env::var("FORK_URL_MONAD")
        .expect("FORK_URL_MONAD must point at an upstream RPC")
        .parse()
        .expect("FORK_URL_MONAD must be a valid URL");
    ForkConfig {
        chain_id: 10143,
        fork_url,
        fork_block_number: FORK_BLOCK,
        port,
        accounts: 10,
        balance: 100_000_000,
    }
}

// Each test gets its own port so the ignored suite can run in parallel.
async fn forked_node(port: u16) -> ForkedNode {
    observe::tracing::initialize_reentrant("warn,benchmarker=debug");
    ForkedNode::spawn(&fork_config(port))
        .await
        .expect("failed to spawn the forked node")
}

fn stored_record(dir: &std::path::Path, alias: &str) -> GasRecord {
    let raw = std::fs::read_to_string(dir.join(format!("{alias}.json")))
        .expect("gas sample file exists");
    serde_json::from_str(&raw).expect("gas sample parses")
}

#[tokio::test]
#[ignore]
async fn crystal_records_a_positive_make_sample() {
    let node = forked_node(8601).await;
    let dir = tempfile::tempdir().unwrap();
    let estimator = Crystal::new(&node, ResultStore::from(dir.path())).unwrap();

    estimator.max_approve().await.unwrap();
    estimator.clear_order_book().await.unwrap();
    estimator.place_limit_bids_at_same_price(3).await.unwrap();

    let record = stored_record(dir.path(), "crystal-make-3");
    assert_eq!(record.alias, "crystal-make-3");
    assert!(record.gas_usage.parse::<u64>().unwrap() > 0);
}

#[tokio::test]
#[ignore]
async fn clearing_an_already_cleared_book_holds_the_baseline() {
    let node = forked_node(8602).await;
    let dir = tempfile::tempdir().unwrap();
    let estimator = Clober::new(&node, ResultStore::from(dir.path())).unwrap();

    estimator.max_approve().await.unwrap();
    estimator.clear_order_book().await.unwrap();
    // Sweeping an empty book consumes nothing and the baseline assertion
    // must still hold.
    estimator.clear_order_book().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn book_state_is_shared_across_adapter_instances() {
    let node = forked_node(8603).await;
    let dir = tempfile::tempdir().unwrap();

    let maker = Gte::new(&node, ResultStore::from(dir.path())).unwrap();
    maker.max_approve().await.unwrap();
    maker.clear_order_book().await.unwrap();
    maker.place_limit_bids_at_same_price(2).await.unwrap();

    // A second instance sees the bids the first one rested. The fork is
    // the single source of truth; adapters hold no book state of their
    // own.
    let taker = Gte::new(&node, ResultStore::from(dir.path())).unwrap();
    taker.take_all_orders(2).await.unwrap();

    let record = stored_record(dir.path(), "gte-take-2");
    assert!(record.gas_usage.parse::<u64>().unwrap() > 0);
}

#[tokio::test]
#[ignore]
async fn kuru_trader_setup_deposits_margin_for_both_tokens() {
    let node = forked_node(8604).await;
    let dir = tempfile::tempdir().unwrap();

    // Construction runs the whole funding flow: faucet mint, token
    // transfers, margin allowances and both deposits. The deposits pull
    // funds with transferFrom, so they only land if the trader granted
    // the margin account an allowance beforehand.
    let estimator = Kuru::new(&node, ResultStore::from(dir.path()))
        .await
        .unwrap();

    estimator.max_approve().await.unwrap();
    estimator.place_limit_bids_at_same_price(2).await.unwrap();

    let record = stored_record(dir.path(), "kuru-make-2");
    assert!(record.gas_usage.parse::<u64>().unwrap() > 0);
}
