use alloy::primitives::B256;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything on a pinned fork is deterministic, so no variant is ever
/// retried: repeating an unchanged on-chain action produces the same
/// outcome. What differs per variant is the blast radius.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The run has no meaningful fallback without its deterministic
    /// starting state (fork unreachable, funding or approvals failed).
    /// Aborts the whole run.
    #[error("setup failed: {0}")]
    Setup(String),

    /// An on-chain assertion did not hold after acting. Aborts the current
    /// adapter only; other adapters still produce comparable samples.
    #[error("{check}: expected {expected}, observed {observed}")]
    PostCondition {
        check: &'static str,
        expected: String,
        observed: String,
    },

    /// The transaction was mined but reverted. Aborts the current phase
    /// and with it the adapter's remaining phases.
    #[error("transaction {hash} reverted")]
    TransactionFailed { hash: B256 },

    #[error(transparent)]
    Execution(#[from] ethrpc::extensions::ExecutionError),

    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    #[error(transparent)]
    Multicall(#[from] alloy::providers::MulticallError),

    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    Confirmation(#[from] alloy::providers::PendingTransactionError),

    #[error("failed to persist gas sample: {0}")]
    Persist(#[from] std::io::Error),

    #[error("failed to encode gas record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    pub fn post_condition(
        check: &'static str,
        expected: impl ToString,
        observed: impl ToString,
    ) -> Self {
        Self::PostCondition {
            check,
            expected: expected.to_string(),
            observed: observed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_condition_names_expected_and_observed() {
        let err = Error::post_condition("order book cleared", "bid 0 / ask 10000", "bid 7 / ask 10000");
        assert_eq!(
            err.to_string(),
            "order book cleared: expected bid 0 / ask 10000, observed bid 7 / ask 10000"
        );
    }
}
