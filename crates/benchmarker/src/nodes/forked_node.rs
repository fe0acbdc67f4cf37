//! Spawns and supervises the forked blockchain node the benchmark runs
//! against.

use {
    crate::{
        error::{Error, Result},
        estimator::RouteKey,
    },
    std::{
        process::Stdio,
        time::{Duration, Instant},
    },
    tokio::process::{Child, Command},
    url::Url,
};

/// Parameters of the fork. All adapters share one fork; the block pin is
/// what makes the benchmark deterministic.
#[derive(Clone, Debug)]
pub struct ForkConfig {
    pub chain_id: u64,
    pub fork_url: Url,
    pub fork_block_number: u64,
    pub port: u16,
    /// Number of pre-funded accounts.
    pub accounts: u64,
    /// Initial native balance per pre-funded account, in whole units.
    pub balance: u64,
}

/// Handle to the forked network, created exactly once per run and passed
/// explicitly into every adapter. The node process is killed on drop.
pub struct ForkedNode {
    _child: Child,
    endpoint: Url,
}

impl ForkedNode {
    /// Spawns an anvil fork with the given parameters and waits until its
    /// RPC endpoint answers.
    ///
    /// Auto-impersonation is always on (transactions can be submitted as
    /// any funded address without key material) and the gas price is
    /// pinned to zero so sweeping large books never drains the
    /// impersonated accounts.
    pub async fn spawn(config: &ForkConfig) -> Result<Self> {
        let child = Command::new("anvil")
            .arg("--port")
            .arg(config.port.to_string())
            .arg("--chain-id")
            .arg(config.chain_id.to_string())
            .arg("--fork-url")
            .arg(config.fork_url.as_str())
            .arg("--fork-block-number")
            .arg(config.fork_block_number.to_string())
            .arg("--accounts")
            .arg(config.accounts.to_string())
            .arg("--balance")
            .arg(config.balance.to_string())
            .arg("--gas-price")
            .arg("0")
            .arg("--auto-impersonate")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| Error::Setup(format!("failed to spawn anvil: {err}")))?;

        let endpoint: Url = format!("http://127.0.0.1:{}/", config.port)
            .parse()
            .map_err(|err| Error::Setup(format!("invalid node endpoint: {err}")))?;

        tokio::time::timeout(
            Duration::from_secs(30),
            Self::wait_until_node_ready(&endpoint),
        )
        .await
        .map_err(|_| Error::Setup("timed out waiting for the forked node to get ready".into()))?;

        Ok(Self {
            _child: child,
            endpoint,
        })
    }

    /// The node might not be able to handle requests right after being
    /// spawned. To not fail runs due to synchronization issues we
    /// periodically query the node until it returned the first successful
    /// response.
    async fn wait_until_node_ready(endpoint: &Url) {
        let client = reqwest::Client::new();

        let query_node = || {
            client
                .post(endpoint.clone())
                .json(&serde_json::json!({
                    "id": 1,
                    "jsonrpc": "2.0",
                    "method": "web3_clientVersion"
                }))
                .send()
        };

        let start = Instant::now();

        while !query_node()
            .await
            .is_ok_and(|res| res.status().is_success())
        {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tracing::debug!(start_up = ?start.elapsed(), "forked node is ready to use");
    }

    /// The shared endpoint with a routing path for one logical
    /// sub-connection. The harness serves the same chain on every route;
    /// distinct routes keep per-connection bookkeeping (nonce sequences in
    /// particular) apart so adapters never race on shared account state.
    pub fn endpoint_for(&self, route: &RouteKey) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(route.as_str());
        url
    }
}
