//! Chain transport abstraction.
//!
//! The gateway never talks to a node directly; it goes through a
//! [`ChainTransport`]. Futures are `!Send`: everything runs on a
//! current-thread runtime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TransportError;
use crate::types::{Address, Shape, TxHash, Value};

/// A read-only contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: Address,
    pub method: String,
    pub args: Vec<Value>,
    pub returns: Shape,
}

impl ContractCall {
    pub fn new(contract: &Address, method: &str, args: Vec<Value>, returns: Shape) -> Self {
        ContractCall {
            contract: contract.clone(),
            method: method.to_string(),
            args,
            returns,
        }
    }
}

/// Transaction envelope. Only the legacy shape (explicit gas price, no
/// fee market fields) is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Legacy,
}

/// Gas settings attached to every write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasParams {
    pub kind: TxKind,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl Default for GasParams {
    fn default() -> Self {
        GasParams {
            kind: TxKind::Legacy,
            gas_limit: 3_000_000,
            gas_price: 20_000_000_000,
        }
    }
}

impl GasParams {
    /// Upper bound the sender must be able to pay.
    pub fn max_cost(&self) -> u128 {
        u128::from(self.gas_limit).saturating_mul(self.gas_price)
    }
}

/// An unsigned state-changing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub method: String,
    pub args: Vec<Value>,
    pub nonce: u64,
    pub gas: GasParams,
}

impl TransactionRequest {
    /// Digest the signer commits to.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.from.as_str().as_bytes());
        hasher.update(self.to.as_str().as_bytes());
        hasher.update(self.method.as_bytes());
        hasher.update(format!("{:?}", self.args).as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.gas.gas_limit.to_be_bytes());
        hasher.update(self.gas.gas_price.to_be_bytes());
        hasher.finalize().into()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub request: TransactionRequest,
    /// Hex signature over [`TransactionRequest::digest`]
    pub signature: String,
}

impl SignedTransaction {
    /// Hash identifying the transaction once submitted.
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(self.request.digest());
        hasher.update(self.signature.as_bytes());
        TxHash::from_digest(&hasher.finalize())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    /// Reverted with the node's error text
    Reverted(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub status: TxStatus,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == TxStatus::Success
    }
}

/// Access to a chain node.
#[async_trait(?Send)]
pub trait ChainTransport {
    async fn chain_id(&self) -> Result<u64, TransportError>;

    /// Timestamp of the latest block, seconds since the epoch.
    async fn latest_timestamp(&self) -> Result<u64, TransportError>;

    /// Whether any contract code lives at `address`.
    async fn code_exists(&self, address: &Address) -> Result<bool, TransportError>;

    /// Executes a read-only call and decodes the result as `call.returns`.
    async fn call(&self, call: &ContractCall) -> Result<Value, TransportError>;

    /// Next nonce for `account`.
    async fn nonce(&self, account: &Address) -> Result<u64, TransportError>;

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxHash, TransportError>;

    /// Waits for the transaction to be mined and returns its receipt.
    async fn confirm(&self, hash: &TxHash) -> Result<Receipt, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(nonce: u64) -> TransactionRequest {
        TransactionRequest {
            from: Address::from_index(1),
            to: Address::from_index(2),
            method: "faucet".to_string(),
            args: vec![Value::Address(Address::from_index(1))],
            nonce,
            gas: GasParams::default(),
        }
    }

    #[test]
    fn test_digest_depends_on_nonce() {
        assert_eq!(request(0).digest(), request(0).digest());
        assert_ne!(request(0).digest(), request(1).digest());
    }

    #[test]
    fn test_hash_format() {
        let tx = SignedTransaction {
            request: request(0),
            signature: "00".to_string(),
        };
        let hash = tx.hash();
        assert!(hash.0.starts_with("0x"));
        assert_eq!(hash.0.len(), 66);
    }

    #[test]
    fn test_default_gas_is_legacy() {
        let gas = GasParams::default();
        assert_eq!(gas.kind, TxKind::Legacy);
        assert_eq!(gas.max_cost(), 3_000_000u128 * 20_000_000_000u128);
    }
}
