//! Thin construction layer over `alloy` providers.
//!
//! Every component talking to the forked chain goes through one of the
//! constructors in this crate so that all connections are built the same
//! way: an erased [`DynProvider`] over an HTTP RPC client pointed at a
//! specific endpoint. Endpoints may carry a routing path segment which the
//! fork harness uses to tell logically separate connections apart.
pub mod extensions;

#[cfg(any(test, feature = "test-util"))]
use alloy::providers::mock;
use {
    alloy::{
        network::EthereumWallet,
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
        signers::local::PrivateKeySigner,
    },
    url::Url,
};

pub type AlloyProvider = DynProvider;

/// Creates a provider for the given endpoint.
///
/// The provider carries no local signer: transactions submitted through it
/// are signed by the node itself, which only works for impersonated
/// accounts on a test network.
pub fn provider(url: &Url) -> AlloyProvider {
    let rpc = ClientBuilder::default().http(url.clone());
    ProviderBuilder::new().connect_client(rpc).erased()
}

/// Creates a provider that signs transactions locally with the given
/// signer. Used for throwaway accounts derived at runtime which the node
/// does not know about.
pub fn provider_with_signer(url: &Url, signer: PrivateKeySigner) -> AlloyProvider {
    let rpc = ClientBuilder::default().http(url.clone());
    let wallet = EthereumWallet::new(signer);
    ProviderBuilder::new()
        .wallet(wallet)
        .connect_client(rpc)
        .erased()
}

/// Creates a provider that answers with pre-queued mocked responses.
///
/// Useful for tests.
#[cfg(any(test, feature = "test-util"))]
pub fn mocked_provider(asserter: mock::Asserter) -> AlloyProvider {
    ProviderBuilder::new()
        .connect_mocked_client(asserter)
        .erased()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mocked_provider_replays_queued_responses() {
        let asserter = mock::Asserter::new();
        asserter.push_success(&"0x279f");

        let provider = mocked_provider(asserter);
        assert_eq!(provider.get_chain_id().await.unwrap(), 10143);
    }
}
