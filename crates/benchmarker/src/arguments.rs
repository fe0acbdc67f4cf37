use {
    crate::nodes::forked_node::ForkConfig,
    clap::{Parser, ValueEnum},
    std::path::PathBuf,
    url::Url,
};

/// Protocols a benchmark run can cover.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Protocol {
    Clober,
    Crystal,
    Gte,
    Kuru,
}

#[derive(Parser)]
pub struct Arguments {
    /// Number of limit bids the make phase places per protocol.
    #[clap(long, env, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub orders: u64,

    /// RPC endpoint of the upstream network to fork.
    #[clap(long, env)]
    pub fork_rpc_url: Url,

    /// Block the fork is pinned to. Every run against the same block and
    /// the same upstream is deterministic.
    #[clap(long, env, default_value = "26608965")]
    pub fork_block_number: u64,

    /// Chain id the forked node reports.
    #[clap(long, env, default_value = "10143")]
    pub chain_id: u64,

    /// Local port the forked node listens on.
    #[clap(long, env, default_value = "8545")]
    pub node_port: u16,

    /// Number of pre-funded accounts the forked node creates.
    #[clap(long, env, default_value = "10")]
    pub node_accounts: u64,

    /// Initial native balance per pre-funded account, in whole units.
    #[clap(long, env, default_value = "100000000")]
    pub node_balance: u64,

    /// Directory gas samples are persisted to, one JSON file per sample.
    #[clap(long, env, default_value = "results")]
    pub results_dir: PathBuf,

    #[clap(long, env, default_value = "warn,benchmarker=debug")]
    pub log_filter: String,

    /// Protocols to benchmark, in execution order.
    #[clap(
        long,
        env,
        use_value_delimiter = true,
        default_value = "clober,crystal,gte,kuru"
    )]
    pub protocols: Vec<Protocol>,
}

impl Arguments {
    pub fn fork_config(&self) -> ForkConfig {
        ForkConfig {
            chain_id: self.chain_id,
            fork_url: self.fork_rpc_url.clone(),
            fork_block_number: self.fork_block_number,
            port: self.node_port,
            accounts: self.node_accounts,
            balance: self.node_balance,
        }
    }
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "orders: {}", self.orders)?;
        writeln!(f, "fork_rpc_url: SECRET")?;
        writeln!(f, "fork_block_number: {}", self.fork_block_number)?;
        writeln!(f, "chain_id: {}", self.chain_id)?;
        writeln!(f, "node_port: {}", self.node_port)?;
        writeln!(f, "node_accounts: {}", self.node_accounts)?;
        writeln!(f, "node_balance: {}", self.node_balance)?;
        writeln!(f, "results_dir: {}", self.results_dir.display())?;
        writeln!(f, "log_filter: {}", self.log_filter)?;
        writeln!(f, "protocols: {:?}", self.protocols)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Arguments, clap::Error> {
        Arguments::try_parse_from(
            ["benchmarker", "--fork-rpc-url", "http://localhost:9000/"]
                .into_iter()
                .chain(args.iter().copied()),
        )
    }

    #[test]
    fn defaults_cover_all_protocols() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.orders, 10);
        assert_eq!(args.fork_block_number, 26608965);
        assert_eq!(args.chain_id, 10143);
        assert_eq!(
            args.protocols,
            [
                Protocol::Clober,
                Protocol::Crystal,
                Protocol::Gte,
                Protocol::Kuru
            ]
        );
    }

    #[test]
    fn protocols_parse_as_comma_separated_list() {
        let args = parse(&["--protocols", "kuru,gte"]).unwrap();
        assert_eq!(args.protocols, [Protocol::Kuru, Protocol::Gte]);
    }

    #[test]
    fn zero_orders_are_rejected() {
        assert!(parse(&["--orders", "0"]).is_err());
        assert!(parse(&["--orders", "1"]).is_ok());
    }

    #[test]
    fn secrets_are_not_displayed() {
        let args = parse(&[]).unwrap();
        assert!(!args.to_string().contains("localhost:9000"));
    }
}
