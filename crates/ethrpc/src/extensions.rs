//! Extension methods for contract call builders.

use alloy::{
    contract::{CallBuilder, CallDecoder},
    providers::{PendingTransactionError, Provider},
    rpc::types::TransactionReceipt,
};

/// Errors produced while submitting a transaction and waiting for it to be
/// mined. Does not cover reverts: a mined transaction with a failed status
/// still yields a receipt and is classified by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),
    #[error(transparent)]
    Confirmation(#[from] PendingTransactionError),
}

/// Extension trait to attach some useful functions to contract call
/// builders.
pub trait CallBuilderExt {
    /// Submits the call as a transaction and waits for its receipt.
    ///
    /// The returned receipt may have a failed status; checking it is up to
    /// the caller since the appropriate reaction depends on the context.
    fn send_and_confirm(
        self,
    ) -> impl Future<Output = Result<TransactionReceipt, ExecutionError>> + Send;
}

impl<P, D> CallBuilderExt for CallBuilder<P, D>
where
    P: Provider,
    D: CallDecoder + Send + Sync,
{
    async fn send_and_confirm(self) -> Result<TransactionReceipt, ExecutionError> {
        let pending = self.send().await?;
        let receipt = pending.get_receipt().await?;
        tracing::debug!(
            hash = ?receipt.transaction_hash,
            gas_used = receipt.gas_used,
            success = receipt.status(),
            "transaction mined",
        );
        Ok(receipt)
    }
}
