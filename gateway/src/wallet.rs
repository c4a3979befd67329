//! Wallet provider abstraction and the signing session built on it.

use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::{GatewayError, Result, WalletError};
use crate::transport::{SignedTransaction, TransactionRequest};
use crate::types::Address;

/// Parameters needed to add a chain to a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParams {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u32,
}

impl NetworkParams {
    /// The local development chain.
    pub fn local(chain_id: u64) -> Self {
        NetworkParams {
            chain_id,
            chain_name: "CyberFi Local".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            currency_name: "Ether".to_string(),
            currency_symbol: "ETH".to_string(),
            currency_decimals: 18,
        }
    }
}

/// An injected browser-style wallet.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Asks the user to grant account access.
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, WalletError>;

    /// Accounts already granted, without prompting.
    async fn accounts(&self) -> std::result::Result<Vec<Address>, WalletError>;

    async fn chain_id(&self) -> std::result::Result<u64, WalletError>;

    /// Fails with [`WalletError::UnknownChain`] when the wallet has never
    /// seen `chain_id`.
    async fn switch_chain(&self, chain_id: u64) -> std::result::Result<(), WalletError>;

    async fn add_chain(&self, params: &NetworkParams) -> std::result::Result<(), WalletError>;

    async fn sign_transaction(
        &self,
        tx: &TransactionRequest,
    ) -> std::result::Result<SignedTransaction, WalletError>;

    /// Account-change notifications. An empty list means the wallet
    /// disconnected.
    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<Address>>;
}

/// An account with signing rights on a known chain.
#[derive(Clone)]
pub struct WalletSession {
    account: Address,
    chain_id: u64,
    provider: Rc<dyn WalletProvider>,
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl WalletSession {
    /// Requests account access and opens a session on the first account.
    pub async fn connect(provider: Option<Rc<dyn WalletProvider>>) -> Result<Self> {
        let provider = provider.ok_or(WalletError::NoProvider)?;
        let accounts = provider.request_accounts().await.map_err(|e| {
            warn!("account request failed: {}", e);
            GatewayError::NotConnected
        })?;
        Self::from_accounts(provider, &accounts).await
    }

    /// Re-opens a session from already granted accounts without prompting.
    pub async fn restore(provider: Rc<dyn WalletProvider>) -> Result<Option<Self>> {
        let accounts = provider.accounts().await?;
        if accounts.is_empty() {
            return Ok(None);
        }
        Self::from_accounts(provider, &accounts).await.map(Some)
    }

    pub(crate) async fn from_accounts(
        provider: Rc<dyn WalletProvider>,
        accounts: &[Address],
    ) -> Result<Self> {
        let account = accounts.first().cloned().ok_or(GatewayError::NotConnected)?;
        let chain_id = provider.chain_id().await?;
        info!("wallet session opened for {} on chain {}", account.short(), chain_id);
        Ok(WalletSession {
            account,
            chain_id,
            provider,
        })
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn provider(&self) -> &Rc<dyn WalletProvider> {
        &self.provider
    }

    pub async fn sign(
        &self,
        tx: &TransactionRequest,
    ) -> std::result::Result<SignedTransaction, WalletError> {
        self.provider.sign_transaction(tx).await
    }
}

/// Outcome of an account-change notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Switched(Address),
    Disconnected,
}

/// Puts the wallet on `expected`, adding the chain if the wallet does not
/// know it. Returns `false` on any other failure.
pub async fn ensure_correct_network(provider: &dyn WalletProvider, expected: &NetworkParams) -> bool {
    match provider.chain_id().await {
        Ok(current) if current == expected.chain_id => return true,
        Ok(_) => {}
        Err(e) => {
            warn!("could not read wallet chain id: {}", e);
            return false;
        }
    }

    match provider.switch_chain(expected.chain_id).await {
        Ok(()) => true,
        Err(WalletError::UnknownChain(_)) => match provider.add_chain(expected).await {
            Ok(()) => {
                info!("added network {} to wallet", expected.chain_name);
                true
            }
            Err(e) => {
                warn!("could not add network {}: {}", expected.chain_name, e);
                false
            }
        },
        Err(e) => {
            warn!("could not switch to chain {}: {}", expected.chain_id, e);
            false
        }
    }
}
