//! Contract gateway
//!
//! One [`ContractGateway`] owns the wallet session and the contract
//! addresses. Views borrow it; there is no global instance.
//!
//! Reads resolve an entity count, fetch every index and decode each tuple
//! through the interface schema. Writes validate locally, run the allowance
//! flow when tokens move, submit a legacy transaction with explicit gas and
//! wait for the receipt.

mod budget;
mod invest;
mod lending;
mod savings;
mod token;

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::config::{ContractKind, GatewayConfig};
use crate::error::{GatewayError, Result, SchemaError, WalletError};
use crate::schema::{methods, EntityInterface, InterfaceProfile, Record};
use crate::transport::{ChainTransport, ContractCall, Receipt, TransactionRequest, TxStatus};
use crate::types::{Address, Shape, TokenAmount, Value};
use crate::wallet::{self, SessionEvent, WalletProvider, WalletSession};

pub use token::FaucetOutcome;

pub struct ContractGateway {
    config: GatewayConfig,
    profile: InterfaceProfile,
    transport: Rc<dyn ChainTransport>,
    provider: Option<Rc<dyn WalletProvider>>,
    session: RefCell<Option<WalletSession>>,
}

impl ContractGateway {
    /// Builds a gateway. The interface schemas for the configured version
    /// are validated here, once.
    pub fn new(
        config: GatewayConfig,
        transport: Rc<dyn ChainTransport>,
        provider: Option<Rc<dyn WalletProvider>>,
    ) -> Result<Self> {
        let profile = InterfaceProfile::new(config.interface)?;
        Ok(ContractGateway {
            config,
            profile,
            transport,
            provider,
            session: RefCell::new(None),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Asks the wallet for account access and opens a signing session.
    /// Returns the active account and the wallet's chain id.
    pub async fn connect(&self) -> Result<(Address, u64)> {
        let session = WalletSession::connect(self.provider.clone()).await?;
        if session.chain_id() != self.config.network.chain_id {
            warn!(
                "wallet is on chain {}, expected {}",
                session.chain_id(),
                self.config.network.chain_id
            );
        }
        let connected = (session.account().clone(), session.chain_id());
        *self.session.borrow_mut() = Some(session);
        Ok(connected)
    }

    pub fn disconnect(&self) {
        if self.session.borrow_mut().take().is_some() {
            info!("wallet session closed");
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.session.borrow().as_ref().map(|s| s.account().clone())
    }

    pub fn is_connected(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Applies an account-change notification: a non-empty list re-derives
    /// the session, an empty one disconnects.
    pub async fn handle_accounts_changed(&self, accounts: Vec<Address>) -> Result<SessionEvent> {
        if accounts.is_empty() {
            self.disconnect();
            return Ok(SessionEvent::Disconnected);
        }
        let provider = self.provider.clone().ok_or(WalletError::NoProvider)?;
        let session = WalletSession::from_accounts(provider, &accounts).await?;
        let account = session.account().clone();
        *self.session.borrow_mut() = Some(session);
        info!("active account changed to {}", account.short());
        Ok(SessionEvent::Switched(account))
    }

    /// Follows the wallet's account-change notifications until the provider
    /// goes away. A notification that cannot be applied leaves the session
    /// as it was.
    pub async fn watch_accounts(&self) -> Result<()> {
        let provider = self.provider.clone().ok_or(WalletError::NoProvider)?;
        let mut changes = provider.subscribe_accounts();
        loop {
            match changes.recv().await {
                Ok(accounts) => {
                    if let Err(e) = self.handle_accounts_changed(accounts).await {
                        warn!("could not apply account change: {}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("missed {} account notifications", skipped);
                }
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }

    /// See [`wallet::ensure_correct_network`].
    pub async fn ensure_correct_network(&self) -> bool {
        match &self.provider {
            Some(provider) => {
                wallet::ensure_correct_network(provider.as_ref(), &self.config.network).await
            }
            None => false,
        }
    }

    /// Whether code is deployed at the configured address for `kind`.
    pub async fn verify_contract_exists(&self, kind: ContractKind) -> bool {
        let address = self.config.addresses.get(kind);
        match self.transport.code_exists(address).await {
            Ok(true) => true,
            Ok(false) => {
                error!("no {} contract deployed at {}", kind.label(), address);
                false
            }
            Err(e) => {
                error!("could not check {} at {}: {}", kind.label(), address, e);
                false
            }
        }
    }

    /// Returns the current session, trying one silent reconnect first.
    async fn ensure_session(&self) -> Result<WalletSession> {
        let existing = self.session.borrow().clone();
        if let Some(session) = existing {
            return Ok(session);
        }

        let provider = self.provider.clone().ok_or(GatewayError::NotInitialized)?;
        debug!("no session, attempting to restore from granted accounts");
        match WalletSession::restore(provider).await {
            Ok(Some(session)) => {
                *self.session.borrow_mut() = Some(session.clone());
                Ok(session)
            }
            Ok(None) => Err(GatewayError::NotInitialized),
            Err(e) => {
                warn!("session restore failed: {}", e);
                Err(GatewayError::NotInitialized)
            }
        }
    }

    async fn read(
        &self,
        contract: &Address,
        method: &str,
        args: Vec<Value>,
        returns: Shape,
    ) -> Result<Value> {
        debug!(%contract, method, "contract read");
        let call = ContractCall::new(contract, method, args, returns);
        self.transport.call(&call).await.map_err(GatewayError::Read)
    }

    async fn read_amount(
        &self,
        contract: &Address,
        method: &str,
        args: Vec<Value>,
    ) -> Result<TokenAmount> {
        let value = self.read(contract, method, args, Shape::I128).await?;
        value
            .as_i128()
            .map(TokenAmount::from_minor)
            .ok_or_else(|| GatewayError::Read(decode_error(method)))
    }

    async fn read_u32(&self, contract: &Address, method: &str, args: Vec<Value>) -> Result<u32> {
        let value = self.read(contract, method, args, Shape::U32).await?;
        value
            .as_u32()
            .ok_or_else(|| GatewayError::Read(decode_error(method)))
    }

    async fn read_u64(&self, contract: &Address, method: &str, args: Vec<Value>) -> Result<u64> {
        let value = self.read(contract, method, args, Shape::U64).await?;
        value
            .as_u64()
            .ok_or_else(|| GatewayError::Read(decode_error(method)))
    }

    /// Entity count from the canonical accessor, or the first probe
    /// candidate that answers when probing is enabled.
    async fn resolve_count(
        &self,
        iface: &EntityInterface,
        contract: &Address,
        owner: &Address,
    ) -> Result<u32> {
        let mut tried = Vec::new();
        for accessor in iface.count_candidates(self.config.probe_counts) {
            match self.read_u32(contract, accessor.method, accessor.args(owner)).await {
                Ok(count) => {
                    debug!(entity = iface.entity(), method = accessor.method, count, "resolved count");
                    return Ok(count);
                }
                Err(e) => {
                    debug!(entity = iface.entity(), method = accessor.method, "count accessor failed: {}", e);
                    tried.push(accessor.method);
                }
            }
        }
        error!(entity = iface.entity(), ?tried, "no count accessor responded");
        Err(GatewayError::ProbeExhausted {
            entity: iface.entity(),
            tried,
        })
    }

    /// Fetches and decodes every entity of one kind. Indices that fail to
    /// load or decode are logged and skipped.
    async fn enumerate<T>(
        &self,
        kind: ContractKind,
        iface: &EntityInterface,
        owner: &Address,
        build: impl Fn(u32, &Record) -> std::result::Result<T, SchemaError>,
    ) -> Result<Vec<T>> {
        if !self.verify_contract_exists(kind).await {
            return Ok(Vec::new());
        }
        let contract = self.config.addresses.get(kind);
        let count = self.resolve_count(iface, contract, owner).await?;
        let shape = iface.schema.shape();

        let mut items = Vec::with_capacity(count as usize);
        for index in 0..count {
            let value = match self
                .read(contract, iface.fetch, iface.fetch_args(owner, index), shape.clone())
                .await
            {
                Ok(value) => value,
                Err(e) => {
                    warn!(entity = iface.entity(), index, "skipping entry: {}", e);
                    continue;
                }
            };
            match iface.schema.decode(value).and_then(|record| build(index, &record)) {
                Ok(item) => items.push(item),
                Err(e) => warn!(entity = iface.entity(), index, "skipping entry: {}", e),
            }
        }
        debug!(entity = iface.entity(), loaded = items.len(), count, "enumerated");
        Ok(items)
    }

    /// Signs, submits and confirms one state-changing call.
    async fn submit(
        &self,
        session: &WalletSession,
        contract: &Address,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Receipt> {
        let from = session.account().clone();
        let nonce = self
            .transport
            .nonce(&from)
            .await
            .map_err(|e| GatewayError::write(e.to_string()))?;

        let request = TransactionRequest {
            from,
            to: contract.clone(),
            method: method.to_string(),
            args,
            nonce,
            gas: self.config.gas,
        };
        debug!(%contract, method, nonce, gas_limit = request.gas.gas_limit, "submitting transaction");

        let signed = session.sign(&request).await.map_err(|e| {
            warn!(method, "signing failed: {}", e);
            GatewayError::write(e.to_string())
        })?;
        let hash = self.transport.submit(&signed).await.map_err(|e| {
            error!(method, "submission failed: {}", e);
            GatewayError::write(e.to_string())
        })?;
        let receipt = self
            .transport
            .confirm(&hash)
            .await
            .map_err(|e| GatewayError::write(e.to_string()))?;

        match &receipt.status {
            TxStatus::Success => {
                info!(tx = %hash, block = receipt.block_number, method, "transaction confirmed");
                Ok(receipt)
            }
            TxStatus::Reverted(reason) => {
                error!(tx = %hash, method, "transaction reverted: {}", reason);
                Err(GatewayError::write(reason.clone()))
            }
        }
    }

    /// Sets the token allowance of `spender` to exactly `amount` and checks
    /// it took effect. A non-zero allowance is reset to zero first.
    async fn approve_with(
        &self,
        session: &WalletSession,
        spender: &Address,
        amount: TokenAmount,
    ) -> Result<()> {
        let token = &self.config.addresses.test_token;
        let owner = session.account();

        let current = self.allowance_of(owner, spender).await?;
        if !current.is_zero() {
            debug!(%spender, %current, "resetting allowance");
            self.submit(
                session,
                token,
                methods::APPROVE,
                vec![owner.into(), spender.into(), TokenAmount::ZERO.into()],
            )
            .await?;
        }

        self.submit(
            session,
            token,
            methods::APPROVE,
            vec![owner.into(), spender.into(), amount.into()],
        )
        .await?;

        let actual = self.allowance_of(owner, spender).await?;
        if actual != amount {
            error!(%spender, expected = %amount, %actual, "allowance read-back mismatch");
            return Err(GatewayError::AllowanceMismatch {
                expected: amount,
                actual,
            });
        }
        Ok(())
    }

    async fn allowance_of(&self, owner: &Address, spender: &Address) -> Result<TokenAmount> {
        self.read_amount(
            &self.config.addresses.test_token,
            methods::ALLOWANCE,
            vec![owner.into(), spender.into()],
        )
        .await
    }
}

fn decode_error(method: &str) -> crate::error::TransportError {
    crate::error::TransportError::Decode(format!("unexpected return from {}", method))
}

/// Parses a positive token amount from user input.
fn parse_amount(input: &str, field: &str) -> Result<TokenAmount> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::Validation(format!("Please enter a {}", field)));
    }
    let amount = TokenAmount::parse(trimmed)
        .map_err(|e| GatewayError::Validation(format!("Invalid {}: {}", field, e)))?;
    if amount.is_zero() {
        return Err(GatewayError::Validation(format!(
            "The {} must be greater than zero",
            field
        )));
    }
    Ok(amount)
}

/// Trimmed, non-empty free text.
fn require_text(input: &str, field: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::Validation(format!("Please enter a {}", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests;
