//! # Test Token Contract
//!
//! A minimal fungible token for the CyberFi test network. Anyone can mint a
//! fixed amount through a rate-limited faucet; balances move through
//! `transfer` or, with a prior allowance, `transfer_from`.
#![no_std]

mod types;

use soroban_sdk::{contract, contractimpl, panic_with_error, Address, Env, String};

pub use crate::types::{
    AllowanceKey, DataKey, TokenEvents, DECIMALS, FAUCET_AMOUNT, FAUCET_COOLDOWN_SECS, ONE_TOKEN,
};

/// Error codes for the test token contract.
///
/// Numbered from 101 so a token failure surfacing through a calling
/// contract stays distinguishable from that contract's own codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum TokenError {
    /// Contract not initialized
    NotInitialized = 101,
    /// Caller is not the admin
    Unauthorized = 102,
    /// Amount must be non-negative (positive for mints)
    InvalidAmount = 103,
    /// Sender balance too low
    InsufficientBalance = 104,
    /// Spender allowance too low
    InsufficientAllowance = 105,
    /// Faucet requested again before the cooldown elapsed
    FaucetCooldown = 106,
}

impl From<TokenError> for soroban_sdk::Error {
    fn from(e: TokenError) -> Self {
        soroban_sdk::Error::from_contract_error(e as u32)
    }
}

#[contract]
pub struct TestTokenContract;

#[contractimpl]
impl TestTokenContract {
    /// Initializes the token with an admin allowed to mint directly.
    pub fn initialize(env: Env, admin: Address) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("Contract already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::TotalSupply, &0i128);
    }

    pub fn name(env: Env) -> String {
        String::from_str(&env, "CyberFi Test Token")
    }

    pub fn symbol(env: Env) -> String {
        String::from_str(&env, "CFT")
    }

    pub fn decimals(_env: Env) -> u32 {
        DECIMALS
    }

    pub fn total_supply(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    /// Mints `FAUCET_AMOUNT` to `to`, at most once per `FAUCET_COOLDOWN_SECS`.
    pub fn faucet(env: Env, to: Address) {
        to.require_auth();
        Self::require_initialized(&env);

        let now = env.ledger().timestamp();
        let key = DataKey::LastFaucet(to.clone());
        if let Some(last) = env.storage().persistent().get::<_, u64>(&key) {
            if now < last.saturating_add(FAUCET_COOLDOWN_SECS) {
                panic_with_error!(&env, TokenError::FaucetCooldown);
            }
        }

        Self::mint_to(&env, &to, FAUCET_AMOUNT);
        env.storage().persistent().set(&key, &now);
        TokenEvents::faucet(&env, &to, FAUCET_AMOUNT, now);
    }

    /// Timestamp of the last faucet request by `user`, or 0 if none.
    pub fn last_faucet_time(env: Env, user: Address) -> u64 {
        env.storage()
            .persistent()
            .get(&DataKey::LastFaucet(user))
            .unwrap_or(0)
    }

    /// Admin-only mint.
    pub fn mint(env: Env, admin: Address, to: Address, amount: i128) {
        admin.require_auth();
        let stored: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .unwrap_or_else(|| panic_with_error!(&env, TokenError::NotInitialized));
        if admin != stored {
            panic_with_error!(&env, TokenError::Unauthorized);
        }
        if amount <= 0 {
            panic_with_error!(&env, TokenError::InvalidAmount);
        }
        Self::mint_to(&env, &to, amount);
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Allowance(AllowanceKey { from, spender }))
            .unwrap_or(0)
    }

    /// Sets (not adds to) the amount `spender` may move out of `from`.
    pub fn approve(env: Env, from: Address, spender: Address, amount: i128) {
        from.require_auth();
        if amount < 0 {
            panic_with_error!(&env, TokenError::InvalidAmount);
        }
        let key = DataKey::Allowance(AllowanceKey {
            from: from.clone(),
            spender: spender.clone(),
        });
        env.storage().persistent().set(&key, &amount);
        TokenEvents::approve(&env, &from, &spender, amount);
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        Self::move_balance(&env, &from, &to, amount);
    }

    /// Moves `amount` from `from` to `to`, spending `spender`'s allowance.
    pub fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();

        let key = DataKey::Allowance(AllowanceKey {
            from: from.clone(),
            spender: spender.clone(),
        });
        let allowance: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        if allowance < amount {
            panic_with_error!(&env, TokenError::InsufficientAllowance);
        }

        Self::move_balance(&env, &from, &to, amount);
        env.storage().persistent().set(&key, &(allowance - amount));
    }

    fn move_balance(env: &Env, from: &Address, to: &Address, amount: i128) {
        if amount < 0 {
            panic_with_error!(env, TokenError::InvalidAmount);
        }

        let from_balance = Self::balance(env.clone(), from.clone());
        if from_balance < amount {
            panic_with_error!(env, TokenError::InsufficientBalance);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Balance(from.clone()), &(from_balance - amount));

        let to_balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .persistent()
            .set(&DataKey::Balance(to.clone()), &(to_balance + amount));

        TokenEvents::transfer(env, from, to, amount);
    }

    fn mint_to(env: &Env, to: &Address, amount: i128) {
        let balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .persistent()
            .set(&DataKey::Balance(to.clone()), &(balance + amount));

        let supply = Self::total_supply(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &(supply + amount));

        TokenEvents::mint(env, to, amount);
    }

    fn require_initialized(env: &Env) {
        if !env.storage().instance().has(&DataKey::Admin) {
            panic_with_error!(env, TokenError::NotInitialized);
        }
    }
}
