//! Gas benchmark for central limit order book protocols. One run spawns a
//! deterministic fork of the upstream network, then drives every selected
//! protocol adapter through the same four phases (approve, clear, make,
//! take) and persists one gas sample per measured phase.

pub mod arguments;
pub mod error;
pub mod estimator;
pub mod nodes;
pub mod results;

use {
    crate::{
        arguments::{Arguments, Protocol},
        error::Error,
        estimator::{GasEstimator, clober::Clober, crystal::Crystal, gte::Gte, kuru::Kuru},
        nodes::forked_node::ForkedNode,
        results::ResultStore,
    },
    anyhow::Context,
};

pub async fn main(args: Arguments) -> anyhow::Result<()> {
    let node = ForkedNode::spawn(&args.fork_config())
        .await
        .context("failed to start the forked network")?;
    let store = ResultStore::from(args.results_dir.as_path());

    // Protocols run strictly sequentially. They share one fork, so
    // interleaving them would make gas samples depend on execution order
    // in ways a reader of the results could not reconstruct.
    let mut failures = Vec::new();
    for protocol in &args.protocols {
        match benchmark(*protocol, &node, store.clone(), args.orders).await {
            Ok(()) => tracing::info!(?protocol, "benchmark completed"),
            // A setup failure means the harness itself is broken;
            // results produced after it would not be trustworthy.
            Err(err @ Error::Setup(_)) => {
                return Err(err).with_context(|| format!("fatal setup failure in {protocol:?}"));
            }
            Err(err) => {
                tracing::error!(?protocol, ?err, "benchmark failed");
                failures.push(*protocol);
            }
        }
    }

    anyhow::ensure!(
        failures.is_empty(),
        "benchmarks failed for {failures:?}; see the logs for details"
    );
    Ok(())
}

/// Runs the four benchmark phases of one protocol in their mandatory
/// order. Errors out of any phase abort the remaining phases of this
/// protocol; partial samples that did get persisted stay persisted.
async fn benchmark(
    protocol: Protocol,
    node: &ForkedNode,
    store: ResultStore,
    orders: u64,
) -> Result<(), Error> {
    let estimator: Box<dyn GasEstimator> = match protocol {
        Protocol::Clober => Box::new(Clober::new(node, store)?),
        Protocol::Crystal => Box::new(Crystal::new(node, store)?),
        Protocol::Gte => Box::new(Gte::new(node, store)?),
        // Adapter construction is setup work; whatever goes wrong in it
        // is promoted to run-fatal.
        Protocol::Kuru => Box::new(Kuru::new(node, store).await.map_err(|err| match err {
            err @ Error::Setup(_) => err,
            err => Error::Setup(format!("kuru trader setup failed: {err}")),
        })?),
    };

    tracing::info!(name = estimator.identity().name, "approving tokens");
    estimator
        .max_approve()
        .await
        // Without allowances in place nothing downstream can work, so
        // approval failures are promoted to run-fatal.
        .map_err(|err| Error::Setup(format!("token approval failed: {err}")))?;

    tracing::info!(name = estimator.identity().name, "clearing the order book");
    estimator.clear_order_book().await?;

    tracing::info!(name = estimator.identity().name, orders, "benchmarking order placement");
    estimator.place_limit_bids_at_same_price(orders).await?;

    tracing::info!(name = estimator.identity().name, orders, "benchmarking order taking");
    estimator.take_all_orders(orders).await?;

    Ok(())
}
