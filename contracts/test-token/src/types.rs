//! Storage keys, constants and events for the test token.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

/// Token precision, matching the usual 18-decimal convention.
pub const DECIMALS: u32 = 18;

/// One whole token in minor units.
pub const ONE_TOKEN: i128 = 1_000_000_000_000_000_000;

/// Tokens minted per faucet request.
pub const FAUCET_AMOUNT: i128 = 100 * ONE_TOKEN;

/// Minimum time between two faucet requests from the same account.
pub const FAUCET_COOLDOWN_SECS: u64 = 60 * 60;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceKey {
    pub from: Address,
    pub spender: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    TotalSupply,
    Balance(Address),
    Allowance(AllowanceKey),
    /// Ledger timestamp of an account's last faucet request
    LastFaucet(Address),
}

pub struct TokenEvents;

impl TokenEvents {
    pub fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) {
        let topics = (symbol_short!("transfer"), from.clone(), to.clone());
        env.events().publish(topics, amount);
    }

    pub fn approve(env: &Env, from: &Address, spender: &Address, amount: i128) {
        let topics = (symbol_short!("approve"), from.clone(), spender.clone());
        env.events().publish(topics, amount);
    }

    pub fn mint(env: &Env, to: &Address, amount: i128) {
        let topics = (symbol_short!("mint"), to.clone());
        env.events().publish(topics, amount);
    }

    pub fn faucet(env: &Env, to: &Address, amount: i128, at: u64) {
        let topics = (symbol_short!("faucet"), to.clone());
        env.events().publish(topics, (amount, at));
    }
}
