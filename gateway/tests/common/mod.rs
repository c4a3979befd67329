//! Shared setup for tests that run the contracts on a local chain.

#![allow(dead_code)]

use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use cyberfi_gateway::local::{Deployment, LocalChain, LocalWallet};
use cyberfi_gateway::{Address, ChainTransport, ContractGateway, WalletProvider};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A local chain with the contracts deployed.
pub struct Harness {
    pub chain: Rc<LocalChain>,
    pub deployment: Deployment,
}

/// One funded account with its own wallet and gateway.
pub struct User {
    pub address: Address,
    pub wallet: Rc<LocalWallet>,
    pub gateway: ContractGateway,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let chain = Rc::new(LocalChain::default());
        let deployment = chain.deploy();
        Harness { chain, deployment }
    }

    /// A new account, connected and funded for gas but holding no tokens.
    pub async fn user(&self) -> User {
        let address = self.chain.create_funded_account();
        let wallet = Rc::new(LocalWallet::new(vec![address.clone()], self.deployment.chain_id));

        let mut config = self.deployment.config();
        config.settle_delay = Duration::ZERO;

        let transport: Rc<dyn ChainTransport> = self.chain.clone();
        let provider: Rc<dyn WalletProvider> = wallet.clone();
        let gateway = ContractGateway::new(config, transport, Some(provider)).unwrap();
        gateway.connect().await.unwrap();

        User {
            address,
            wallet,
            gateway,
        }
    }

    /// A connected account that has claimed the faucet once.
    pub async fn funded_user(&self) -> User {
        let user = self.user().await;
        user.gateway.request_test_tokens().await.unwrap();
        user
    }
}
