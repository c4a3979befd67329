//! In-process chain running the CyberFi contracts.
//!
//! Contracts execute in a Soroban test environment with auth mocked. Each
//! account and contract gets a hex label so the gateway can address it the
//! same way it would address a remote node. Submitted transactions are
//! checked for signature, nonce and gas funds, executed immediately, and
//! leave a receipt in a one-transaction block.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{Env, IntoVal, Symbol, TryFromVal, Val};
use tracing::{debug, info};

use budget_manager::{BudgetError, BudgetManagerContract};
use community_savings::{CommunitySavingsContract, CommunitySavingsContractClient, SavingsError};
use micro_investor::{InvestorError, MicroInvestorContract, MicroInvestorContractClient};
use micro_lending::{LendingError, MicroLendingContract, MicroLendingContractClient};
use test_token::{TestTokenContract, TestTokenContractClient, TokenError};

use super::wallet::local_signature;
use crate::config::{AddressManifest, ContractAddresses, ContractKind, GatewayConfig};
use crate::error::{ConfigError, TransportError};
use crate::transport::{ChainTransport, ContractCall, Receipt, SignedTransaction, TxStatus};
use crate::types::{Address, Shape, TokenAmount, TxHash, Value};

pub const LOCAL_CHAIN_ID: u64 = 1337;
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
/// Native balance given to accounts created with [`LocalChain::create_funded_account`].
pub const DEFAULT_NATIVE_BALANCE: u128 = 100_000_000_000_000_000_000;

const BASE_TX_GAS: u64 = 21_000;
const CALL_GAS: u64 = 79_000;

struct Account {
    id: soroban_sdk::Address,
    nonce: u64,
    native_balance: u128,
}

struct Contract {
    id: soroban_sdk::Address,
    kind: ContractKind,
}

#[derive(Default)]
struct ChainState {
    next_label: u64,
    accounts: BTreeMap<Address, Account>,
    contracts: BTreeMap<Address, Contract>,
    receipts: HashMap<TxHash, Receipt>,
    block_number: u64,
    deployment: Option<Deployment>,
}

/// Contracts deployed by [`LocalChain::deploy`].
#[derive(Clone, Debug)]
pub struct Deployment {
    pub chain_id: u64,
    pub admin: Address,
    pub addresses: ContractAddresses,
}

impl Deployment {
    pub fn manifest(&self) -> AddressManifest {
        AddressManifest::from_addresses(&self.addresses, self.chain_id)
    }

    pub fn write_manifest(&self, path: &Path) -> Result<(), ConfigError> {
        self.manifest().write(path)
    }

    /// Gateway configuration pointing at this deployment.
    pub fn config(&self) -> GatewayConfig {
        GatewayConfig::new(self.addresses.clone(), self.chain_id)
    }
}

pub struct LocalChain {
    env: Env,
    chain_id: u64,
    state: RefCell<ChainState>,
}

impl Default for LocalChain {
    fn default() -> Self {
        Self::new(LOCAL_CHAIN_ID)
    }
}

impl LocalChain {
    pub fn new(chain_id: u64) -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().with_mut(|li| {
            li.timestamp = GENESIS_TIMESTAMP;
        });
        LocalChain {
            env,
            chain_id,
            state: RefCell::new(ChainState {
                next_label: 1,
                ..Default::default()
            }),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn create_account(&self, native_balance: u128) -> Address {
        self.add_account(native_balance).0
    }

    fn add_account(&self, native_balance: u128) -> (Address, soroban_sdk::Address) {
        let id = soroban_sdk::Address::generate(&self.env);
        let mut state = self.state.borrow_mut();
        let label = Address::from_index(state.next_label);
        state.next_label += 1;
        state.accounts.insert(
            label.clone(),
            Account {
                id: id.clone(),
                nonce: 0,
                native_balance,
            },
        );
        debug!(account = %label, "created local account");
        (label, id)
    }

    pub fn create_funded_account(&self) -> Address {
        self.create_account(DEFAULT_NATIVE_BALANCE)
    }

    pub fn native_balance(&self, account: &Address) -> u128 {
        self.state
            .borrow()
            .accounts
            .get(account)
            .map(|a| a.native_balance)
            .unwrap_or(0)
    }

    pub fn set_native_balance(&self, account: &Address, balance: u128) {
        if let Some(a) = self.state.borrow_mut().accounts.get_mut(account) {
            a.native_balance = balance;
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.env.ledger().timestamp()
    }

    pub fn advance_time(&self, secs: u64) {
        self.env.ledger().with_mut(|li| {
            li.timestamp += secs;
        });
    }

    /// Registers and initializes all five contracts. Minimum investment is
    /// one token.
    pub fn deploy(&self) -> Deployment {
        let (admin, admin_id) = self.add_account(DEFAULT_NATIVE_BALANCE);

        let token_id = self.env.register(TestTokenContract, ());
        TestTokenContractClient::new(&self.env, &token_id).initialize(&admin_id);

        let budget_id = self.env.register(BudgetManagerContract, ());

        let investor_id = self.env.register(MicroInvestorContract, ());
        MicroInvestorContractClient::new(&self.env, &investor_id).initialize(
            &admin_id,
            &token_id,
            &TokenAmount::tokens(1).minor(),
        );

        let lending_id = self.env.register(MicroLendingContract, ());
        MicroLendingContractClient::new(&self.env, &lending_id).initialize(&admin_id, &token_id);

        let savings_id = self.env.register(CommunitySavingsContract, ());
        CommunitySavingsContractClient::new(&self.env, &savings_id)
            .initialize(&admin_id, &token_id);

        let addresses = ContractAddresses {
            budget_manager: self.register_contract(budget_id, ContractKind::BudgetManager),
            micro_investor: self.register_contract(investor_id, ContractKind::MicroInvestor),
            test_token: self.register_contract(token_id, ContractKind::TestToken),
            micro_lending: self.register_contract(lending_id, ContractKind::MicroLending),
            community_savings: self
                .register_contract(savings_id, ContractKind::CommunitySavings),
        };
        info!(?addresses, "deployed CyberFi contracts");

        let deployment = Deployment {
            chain_id: self.chain_id,
            admin,
            addresses,
        };
        self.state.borrow_mut().deployment = Some(deployment.clone());
        deployment
    }

    /// Mints test tokens to `to` from the deployment admin.
    pub fn mint(&self, to: &Address, amount: TokenAmount) -> Result<(), TransportError> {
        let deployment = self
            .state
            .borrow()
            .deployment
            .clone()
            .ok_or_else(|| TransportError::Unavailable("contracts not deployed".to_string()))?;
        self.invoke(
            &deployment.addresses.test_token,
            "mint",
            &[
                Value::Address(deployment.admin.clone()),
                Value::Address(to.clone()),
                amount.into(),
            ],
        )
        .map(|_| ())
        .map_err(TransportError::Call)
    }

    fn register_contract(&self, id: soroban_sdk::Address, kind: ContractKind) -> Address {
        let mut state = self.state.borrow_mut();
        let label = Address::from_index(state.next_label);
        state.next_label += 1;
        state.contracts.insert(label.clone(), Contract { id, kind });
        label
    }

    fn soroban_id(&self, address: &Address) -> Result<soroban_sdk::Address, TransportError> {
        let state = self.state.borrow();
        state
            .accounts
            .get(address)
            .map(|a| a.id.clone())
            .or_else(|| state.contracts.get(address).map(|c| c.id.clone()))
            .ok_or_else(|| TransportError::Call(format!("unknown address {}", address)))
    }

    fn label_of(&self, id: &soroban_sdk::Address) -> Result<Address, TransportError> {
        let state = self.state.borrow();
        state
            .accounts
            .iter()
            .find(|(_, a)| &a.id == id)
            .map(|(label, _)| label.clone())
            .or_else(|| {
                state
                    .contracts
                    .iter()
                    .find(|(_, c)| &c.id == id)
                    .map(|(label, _)| label.clone())
            })
            .ok_or_else(|| TransportError::Decode("address not known to this chain".to_string()))
    }

    fn to_val(&self, value: &Value) -> Result<Val, TransportError> {
        let env = &self.env;
        Ok(match value {
            Value::Unit => ().into_val(env),
            Value::Bool(b) => (*b).into_val(env),
            Value::U32(v) => (*v).into_val(env),
            Value::U64(v) => (*v).into_val(env),
            Value::I128(v) => (*v).into_val(env),
            Value::Text(s) => soroban_sdk::String::from_str(env, s).into_val(env),
            Value::Address(a) => self.soroban_id(a)?.into_val(env),
            Value::Tuple(_) => {
                return Err(TransportError::Call(
                    "tuple arguments are not supported".to_string(),
                ))
            }
        })
    }

    fn from_val(&self, val: Val, shape: &Shape) -> Result<Value, TransportError> {
        let env = &self.env;
        Ok(match shape {
            Shape::Unit => Value::Unit,
            Shape::Bool => Value::Bool(bool::try_from_val(env, &val).map_err(bad)?),
            Shape::U32 => Value::U32(u32::try_from_val(env, &val).map_err(bad)?),
            Shape::U64 => Value::U64(u64::try_from_val(env, &val).map_err(bad)?),
            Shape::I128 => Value::I128(i128::try_from_val(env, &val).map_err(bad)?),
            Shape::Text => {
                let s = soroban_sdk::String::try_from_val(env, &val).map_err(bad)?;
                let mut buf = vec![0u8; s.len() as usize];
                s.copy_into_slice(&mut buf);
                Value::Text(
                    String::from_utf8(buf)
                        .map_err(|e| TransportError::Decode(e.to_string()))?,
                )
            }
            Shape::Address => {
                let id = soroban_sdk::Address::try_from_val(env, &val).map_err(bad)?;
                Value::Address(self.label_of(&id)?)
            }
            Shape::OptionalAddress => {
                let id = Option::<soroban_sdk::Address>::try_from_val(env, &val).map_err(bad)?;
                match id {
                    Some(id) => Value::Address(self.label_of(&id)?),
                    None => Value::Address(Address::zero()),
                }
            }
            Shape::Tuple(shapes) => {
                let items = soroban_sdk::Vec::<Val>::try_from_val(env, &val).map_err(bad)?;
                if items.len() as usize != shapes.len() {
                    return Err(TransportError::Decode(format!(
                        "expected {} tuple fields, got {}",
                        shapes.len(),
                        items.len()
                    )));
                }
                let mut values = Vec::with_capacity(shapes.len());
                for (item, shape) in items.iter().zip(shapes) {
                    values.push(self.from_val(item, shape)?);
                }
                Value::Tuple(values)
            }
        })
    }

    /// Runs a contract function. Failures come back as node-style error
    /// text, e.g. `execution reverted: budget exceeded`.
    fn invoke(&self, contract: &Address, method: &str, args: &[Value]) -> Result<Val, String> {
        let kind = self
            .state
            .borrow()
            .contracts
            .get(contract)
            .map(|c| c.kind)
            .ok_or_else(|| format!("no contract at {}", contract))?;
        let id = self.soroban_id(contract).map_err(|e| e.to_string())?;

        let mut vals = soroban_sdk::Vec::<Val>::new(&self.env);
        for arg in args {
            vals.push_back(self.to_val(arg).map_err(|e| e.to_string())?);
        }

        let func = Symbol::new(&self.env, method);
        match self
            .env
            .try_invoke_contract::<Val, soroban_sdk::Error>(&id, &func, vals)
        {
            Ok(Ok(val)) => Ok(val),
            Ok(Err(e)) => Err(format!("execution reverted: bad return value ({:?})", e)),
            Err(Ok(error)) => Err(format!("execution reverted: {}", revert_reason(kind, error))),
            Err(Err(e)) => Err(format!("execution reverted: {:?}", e)),
        }
    }
}

const TOKEN_REASONS: &[(u32, &str)] = &[
    (TokenError::NotInitialized as u32, "token not initialized"),
    (TokenError::Unauthorized as u32, "unauthorized"),
    (TokenError::InvalidAmount as u32, "invalid amount"),
    (TokenError::InsufficientBalance as u32, "insufficient balance"),
    (TokenError::InsufficientAllowance as u32, "insufficient allowance"),
    (TokenError::FaucetCooldown as u32, "Please wait before requesting more tokens"),
];

const BUDGET_REASONS: &[(u32, &str)] = &[
    (BudgetError::EmptyCategory as u32, "category cannot be empty"),
    (BudgetError::CategoryTooLong as u32, "category name too long"),
    (BudgetError::InvalidAmount as u32, "invalid amount"),
    (BudgetError::DuplicateCategory as u32, "budget category already exists"),
    (BudgetError::BudgetNotFound as u32, "budget not found"),
    (BudgetError::BudgetExceeded as u32, "budget exceeded"),
];

const INVESTOR_REASONS: &[(u32, &str)] = &[
    (InvestorError::NotInitialized as u32, "investment pool not initialized"),
    (InvestorError::BelowMinimum as u32, "below minimum investment"),
    (InvestorError::InvalidAmount as u32, "invalid amount"),
    (InvestorError::InsufficientBalance as u32, "insufficient balance"),
];

const LENDING_REASONS: &[(u32, &str)] = &[
    (LendingError::NotInitialized as u32, "loan book not initialized"),
    (LendingError::Unauthorized as u32, "unauthorized"),
    (LendingError::InvalidAmount as u32, "loan amount out of range"),
    (LendingError::InvalidInterestRate as u32, "interest rate out of range"),
    (LendingError::InvalidDuration as u32, "loan duration out of range"),
    (LendingError::LoanNotFound as u32, "loan not found"),
    (LendingError::LoanUnavailable as u32, "loan not available"),
    (LendingError::NotBorrower as u32, "not the borrower"),
    (LendingError::NotLender as u32, "not the lender"),
    (LendingError::SelfBorrow as u32, "cannot borrow your own offer"),
];

const SAVINGS_REASONS: &[(u32, &str)] = &[
    (SavingsError::NotInitialized as u32, "savings not initialized"),
    (SavingsError::InvalidName as u32, "invalid pool name"),
    (SavingsError::InvalidAmount as u32, "invalid amount"),
    (SavingsError::PoolNotFound as u32, "pool not found"),
    (SavingsError::PoolClosed as u32, "pool is closed"),
    (SavingsError::NotCreator as u32, "not the pool creator"),
];

/// Revert text for a contract error code. Token codes are checked first
/// since token failures surface through every contract that moves tokens.
fn revert_reason(kind: ContractKind, error: soroban_sdk::Error) -> String {
    let own = match kind {
        ContractKind::TestToken => &[][..],
        ContractKind::BudgetManager => BUDGET_REASONS,
        ContractKind::MicroInvestor => INVESTOR_REASONS,
        ContractKind::MicroLending => LENDING_REASONS,
        ContractKind::CommunitySavings => SAVINGS_REASONS,
    };

    TOKEN_REASONS
        .iter()
        .chain(own)
        .find(|(code, _)| error == soroban_sdk::Error::from_contract_error(*code))
        .map(|(_, reason)| reason.to_string())
        .unwrap_or_else(|| format!("{:?}", error))
}

fn bad<E: std::fmt::Debug>(e: E) -> TransportError {
    TransportError::Decode(format!("{:?}", e))
}

#[async_trait(?Send)]
impl ChainTransport for LocalChain {
    async fn chain_id(&self) -> Result<u64, TransportError> {
        Ok(self.chain_id)
    }

    async fn latest_timestamp(&self) -> Result<u64, TransportError> {
        Ok(self.timestamp())
    }

    async fn code_exists(&self, address: &Address) -> Result<bool, TransportError> {
        Ok(self.state.borrow().contracts.contains_key(address))
    }

    async fn call(&self, call: &ContractCall) -> Result<Value, TransportError> {
        let val = self
            .invoke(&call.contract, &call.method, &call.args)
            .map_err(TransportError::Call)?;
        self.from_val(val, &call.returns)
    }

    async fn nonce(&self, account: &Address) -> Result<u64, TransportError> {
        Ok(self
            .state
            .borrow()
            .accounts
            .get(account)
            .map(|a| a.nonce)
            .unwrap_or(0))
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxHash, TransportError> {
        let request = &tx.request;
        if tx.signature != local_signature(&request.from, &request.digest()) {
            return Err(TransportError::Rejected("invalid signature".to_string()));
        }

        {
            let state = self.state.borrow();
            let sender = state.accounts.get(&request.from).ok_or_else(|| {
                TransportError::Rejected(format!("unknown sender {}", request.from))
            })?;
            if request.nonce < sender.nonce {
                return Err(TransportError::Rejected("nonce too low".to_string()));
            }
            if request.nonce > sender.nonce {
                return Err(TransportError::Rejected("nonce too high".to_string()));
            }
            if sender.native_balance < request.gas.max_cost() {
                return Err(TransportError::Rejected(
                    "insufficient funds for gas * price + value".to_string(),
                ));
            }
        }

        let status = match self.invoke(&request.to, &request.method, &request.args) {
            Ok(_) => TxStatus::Success,
            Err(reason) => TxStatus::Reverted(reason),
        };
        let gas_used = (BASE_TX_GAS + CALL_GAS).min(request.gas.gas_limit);
        let hash = tx.hash();

        let mut state = self.state.borrow_mut();
        if let Some(sender) = state.accounts.get_mut(&request.from) {
            sender.nonce += 1;
            sender.native_balance = sender
                .native_balance
                .saturating_sub(u128::from(gas_used) * request.gas.gas_price);
        }
        state.block_number += 1;
        let receipt = Receipt {
            tx_hash: hash.clone(),
            block_number: state.block_number,
            gas_used,
            status,
        };
        debug!(tx = %hash, method = %request.method, block = receipt.block_number, "mined");
        state.receipts.insert(hash.clone(), receipt);
        drop(state);

        self.env.ledger().with_mut(|li| {
            li.sequence_number += 1;
        });
        Ok(hash)
    }

    async fn confirm(&self, hash: &TxHash) -> Result<Receipt, TransportError> {
        self.state
            .borrow()
            .receipts
            .get(hash)
            .cloned()
            .ok_or_else(|| TransportError::UnknownTransaction(hash.clone()))
    }
}
