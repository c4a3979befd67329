//! # Micro Investor Contract
//!
//! Pools small token deposits. Users approve the contract as a spender on
//! the token, deposit at least the configured minimum, and can withdraw
//! their balance at any time.
#![no_std]

mod token;

use soroban_sdk::{contract, contractimpl, contracttype, panic_with_error, symbol_short, Address, Env};

use crate::token::TokenClient;

/// Storage keys for the contract
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Token,
    MinInvestment,
    TotalDeposits,
    Balance(Address),
}

/// Error codes for the micro investor contract.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum InvestorError {
    /// Contract not initialized
    NotInitialized = 1,
    /// Deposit below the minimum investment
    BelowMinimum = 2,
    /// Amount must be positive
    InvalidAmount = 3,
    /// Withdrawal larger than the invested balance
    InsufficientBalance = 4,
}

impl From<InvestorError> for soroban_sdk::Error {
    fn from(e: InvestorError) -> Self {
        soroban_sdk::Error::from_contract_error(e as u32)
    }
}

#[contract]
pub struct MicroInvestorContract;

#[contractimpl]
impl MicroInvestorContract {
    /// Initializes the pool.
    ///
    /// # Arguments
    /// * `admin` - Administrator address
    /// * `token` - Token accepted for deposits
    /// * `min_investment` - Smallest accepted deposit, in minor units
    pub fn initialize(env: Env, admin: Address, token: Address, min_investment: i128) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("Contract already initialized");
        }
        if min_investment <= 0 {
            panic_with_error!(&env, InvestorError::InvalidAmount);
        }

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage()
            .instance()
            .set(&DataKey::MinInvestment, &min_investment);
        env.storage().instance().set(&DataKey::TotalDeposits, &0i128);
    }

    /// Pulls `amount` tokens from `user` (requires a prior allowance) and
    /// credits the user's investment balance.
    pub fn deposit(env: Env, user: Address, amount: i128) {
        user.require_auth();

        if amount < Self::min_investment(env.clone()) {
            panic_with_error!(&env, InvestorError::BelowMinimum);
        }

        let contract = env.current_contract_address();
        Self::token_client(&env).transfer_from(&contract, &user, &contract, &amount);

        let balance = Self::get_user_balance(env.clone(), user.clone());
        env.storage()
            .persistent()
            .set(&DataKey::Balance(user.clone()), &(balance + amount));
        let total = Self::total_deposits(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::TotalDeposits, &(total + amount));

        env.events()
            .publish((symbol_short!("invest"), symbol_short!("deposit"), user), amount);
    }

    /// Returns `amount` of the user's invested tokens.
    pub fn withdraw(env: Env, user: Address, amount: i128) {
        user.require_auth();

        if amount <= 0 {
            panic_with_error!(&env, InvestorError::InvalidAmount);
        }
        let balance = Self::get_user_balance(env.clone(), user.clone());
        if amount > balance {
            panic_with_error!(&env, InvestorError::InsufficientBalance);
        }

        env.storage()
            .persistent()
            .set(&DataKey::Balance(user.clone()), &(balance - amount));
        let total = Self::total_deposits(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::TotalDeposits, &(total - amount));

        let contract = env.current_contract_address();
        Self::token_client(&env).transfer(&contract, &user, &amount);

        env.events()
            .publish((symbol_short!("invest"), symbol_short!("withdraw"), user), amount);
    }

    /// Invested balance of `user`.
    pub fn get_user_balance(env: Env, user: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(user))
            .unwrap_or(0)
    }

    pub fn total_deposits(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalDeposits)
            .unwrap_or(0)
    }

    pub fn min_investment(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::MinInvestment)
            .unwrap_or_else(|| panic_with_error!(&env, InvestorError::NotInitialized))
    }

    pub fn token(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Token)
            .unwrap_or_else(|| panic_with_error!(&env, InvestorError::NotInitialized))
    }

    fn token_client(env: &Env) -> TokenClient<'_> {
        TokenClient::new(env, &Self::token(env.clone()))
    }
}
