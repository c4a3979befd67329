//! Scripted transport for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;

use crate::config::{ContractAddresses, GatewayConfig};
use crate::error::TransportError;
use crate::gateway::ContractGateway;
use crate::local::LocalWallet;
use crate::transport::{
    ChainTransport, ContractCall, Receipt, SignedTransaction, TransactionRequest, TxStatus,
};
use crate::types::{Address, TxHash, Value};
use crate::wallet::WalletProvider;

type CallHandler = Box<dyn Fn(&ContractCall) -> Result<Value, TransportError>>;
type SendHandler = Box<dyn Fn(&TransactionRequest) -> TxStatus>;

/// Answers reads from per-method handlers and records every call.
pub struct MockTransport {
    calls: RefCell<HashMap<String, CallHandler>>,
    sends: RefCell<HashMap<String, SendHandler>>,
    log: RefCell<Vec<String>>,
    receipts: RefCell<HashMap<TxHash, Receipt>>,
    has_code: Cell<bool>,
    timestamp: Cell<u64>,
    nonce: Cell<u64>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(MockTransport {
            calls: RefCell::new(HashMap::new()),
            sends: RefCell::new(HashMap::new()),
            log: RefCell::new(Vec::new()),
            receipts: RefCell::new(HashMap::new()),
            has_code: Cell::new(true),
            timestamp: Cell::new(1_700_000_000),
            nonce: Cell::new(0),
        })
    }

    pub fn on_call(
        &self,
        method: &str,
        handler: impl Fn(&ContractCall) -> Result<Value, TransportError> + 'static,
    ) {
        self.calls
            .borrow_mut()
            .insert(method.to_string(), Box::new(handler));
    }

    /// Always answers `method` with `value`.
    pub fn returns(&self, method: &str, value: Value) {
        self.on_call(method, move |_| Ok(value.clone()));
    }

    pub fn on_send(&self, method: &str, handler: impl Fn(&TransactionRequest) -> TxStatus + 'static) {
        self.sends
            .borrow_mut()
            .insert(method.to_string(), Box::new(handler));
    }

    pub fn set_code(&self, present: bool) {
        self.has_code.set(present);
    }

    pub fn set_timestamp(&self, ts: u64) {
        self.timestamp.set(ts);
    }

    /// `call:<method>` and `send:<method>` entries in order.
    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn sent(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix("send:").map(str::to_string))
            .collect()
    }
}

#[async_trait(?Send)]
impl ChainTransport for MockTransport {
    async fn chain_id(&self) -> Result<u64, TransportError> {
        Ok(1337)
    }

    async fn latest_timestamp(&self) -> Result<u64, TransportError> {
        Ok(self.timestamp.get())
    }

    async fn code_exists(&self, _address: &Address) -> Result<bool, TransportError> {
        Ok(self.has_code.get())
    }

    async fn call(&self, call: &ContractCall) -> Result<Value, TransportError> {
        tokio::task::yield_now().await;
        self.log.borrow_mut().push(format!("call:{}", call.method));
        match self.calls.borrow().get(&call.method) {
            Some(handler) => handler(call),
            None => Err(TransportError::Call(format!(
                "execution reverted: no method {}",
                call.method
            ))),
        }
    }

    async fn nonce(&self, _account: &Address) -> Result<u64, TransportError> {
        Ok(self.nonce.get())
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxHash, TransportError> {
        tokio::task::yield_now().await;
        let request = &tx.request;
        self.log.borrow_mut().push(format!("send:{}", request.method));
        self.nonce.set(self.nonce.get() + 1);

        let status = match self.sends.borrow().get(&request.method) {
            Some(handler) => handler(request),
            None => TxStatus::Success,
        };
        let hash = tx.hash();
        self.receipts.borrow_mut().insert(
            hash.clone(),
            Receipt {
                tx_hash: hash.clone(),
                block_number: self.nonce.get(),
                gas_used: 21_000,
                status,
            },
        );
        Ok(hash)
    }

    async fn confirm(&self, hash: &TxHash) -> Result<Receipt, TransportError> {
        self.receipts
            .borrow()
            .get(hash)
            .cloned()
            .ok_or_else(|| TransportError::UnknownTransaction(hash.clone()))
    }
}

pub fn user() -> Address {
    Address::from_index(1)
}

pub fn addresses() -> ContractAddresses {
    ContractAddresses {
        budget_manager: Address::from_index(101),
        micro_investor: Address::from_index(102),
        test_token: Address::from_index(103),
        micro_lending: Address::from_index(104),
        community_savings: Address::from_index(105),
    }
}

/// A gateway over `transport` with a granted wallet holding [`user`].
pub fn gateway(transport: &Rc<MockTransport>) -> (ContractGateway, Rc<LocalWallet>) {
    let wallet = Rc::new(LocalWallet::new(vec![user()], 1337));
    wallet.grant();
    let mut config = GatewayConfig::new(addresses(), 1337);
    config.settle_delay = std::time::Duration::ZERO;

    let transport: Rc<dyn ChainTransport> = transport.clone();
    let provider: Rc<dyn WalletProvider> = wallet.clone();
    let gateway = ContractGateway::new(config, transport, Some(provider))
        .unwrap_or_else(|e| panic!("gateway: {}", e));
    (gateway, wallet)
}
