//! In-process wallet for development and tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::WalletError;
use crate::transport::{SignedTransaction, TransactionRequest};
use crate::types::Address;
use crate::wallet::{NetworkParams, WalletProvider};

/// Signature the local wallet produces and the local chain accepts.
pub fn local_signature(account: &Address, digest: &[u8; 32]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account.as_str().as_bytes());
    hasher.update(digest);
    hex::encode(hasher.finalize())
}

/// A wallet holding a fixed list of accounts.
///
/// Access must be granted with `request_accounts` before `accounts`
/// reports anything, like an injected browser wallet.
pub struct LocalWallet {
    accounts: RefCell<Vec<Address>>,
    granted: Cell<bool>,
    chain_id: Cell<u64>,
    known_chains: RefCell<BTreeSet<u64>>,
    reject_signing: Cell<bool>,
    chain_id_failures: Cell<u32>,
    changes: broadcast::Sender<Vec<Address>>,
}

impl LocalWallet {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        let (changes, _) = broadcast::channel(16);
        LocalWallet {
            accounts: RefCell::new(accounts),
            granted: Cell::new(false),
            chain_id: Cell::new(chain_id),
            known_chains: RefCell::new(BTreeSet::from([chain_id])),
            reject_signing: Cell::new(false),
            chain_id_failures: Cell::new(0),
            changes,
        }
    }

    /// Grants access up front, as if the user approved earlier.
    pub fn grant(&self) {
        self.granted.set(true);
    }

    /// Makes `account` the active one and notifies subscribers.
    pub fn switch_account(&self, account: Address) {
        {
            let mut accounts = self.accounts.borrow_mut();
            accounts.retain(|a| a != &account);
            accounts.insert(0, account);
        }
        self.notify();
    }

    /// Revokes access and notifies subscribers with an empty list.
    pub fn disconnect(&self) {
        self.granted.set(false);
        let _ = self.changes.send(Vec::new());
    }

    /// Simulates the user declining every signature request.
    pub fn set_reject_signing(&self, reject: bool) {
        self.reject_signing.set(reject);
    }

    /// Makes the next `count` chain id lookups fail.
    pub fn fail_chain_id_lookups(&self, count: u32) {
        self.chain_id_failures.set(count);
    }

    /// Moves the wallet to another chain without going through
    /// `switch_chain`, as a user would from the wallet UI.
    pub fn set_chain(&self, chain_id: u64) {
        self.known_chains.borrow_mut().insert(chain_id);
        self.chain_id.set(chain_id);
    }

    pub fn forget_chain(&self, chain_id: u64) {
        self.known_chains.borrow_mut().remove(&chain_id);
    }

    fn notify(&self) {
        let accounts = if self.granted.get() {
            self.accounts.borrow().clone()
        } else {
            Vec::new()
        };
        // No receivers is fine.
        let _ = self.changes.send(accounts);
    }
}

#[async_trait(?Send)]
impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let accounts = self.accounts.borrow().clone();
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        self.granted.set(true);
        Ok(accounts)
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        if self.granted.get() {
            Ok(self.accounts.borrow().clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let failures = self.chain_id_failures.get();
        if failures > 0 {
            self.chain_id_failures.set(failures - 1);
            return Err(WalletError::Provider("chain id unavailable".to_string()));
        }
        Ok(self.chain_id.get())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        if !self.known_chains.borrow().contains(&chain_id) {
            return Err(WalletError::UnknownChain(chain_id));
        }
        self.chain_id.set(chain_id);
        Ok(())
    }

    async fn add_chain(&self, params: &NetworkParams) -> Result<(), WalletError> {
        info!("adding chain {} ({})", params.chain_id, params.chain_name);
        self.known_chains.borrow_mut().insert(params.chain_id);
        self.chain_id.set(params.chain_id);
        Ok(())
    }

    async fn sign_transaction(
        &self,
        tx: &TransactionRequest,
    ) -> Result<SignedTransaction, WalletError> {
        if self.reject_signing.get() {
            return Err(WalletError::UserRejected);
        }
        if !self.granted.get() || !self.accounts.borrow().contains(&tx.from) {
            return Err(WalletError::Provider(format!(
                "account {} is not available",
                tx.from
            )));
        }
        debug!(method = %tx.method, nonce = tx.nonce, "signing transaction");
        Ok(SignedTransaction {
            request: tx.clone(),
            signature: local_signature(&tx.from, &tx.digest()),
        })
    }

    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<Address>> {
        self.changes.subscribe()
    }
}
