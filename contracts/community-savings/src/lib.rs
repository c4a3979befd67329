//! # Community Savings Contract
//!
//! Group savings pools. Anyone can open a pool with a name and a goal;
//! members contribute tokens (through an allowance) until the creator
//! closes the pool and receives the pooled balance.
#![no_std]

mod token;
mod types;

use soroban_sdk::{contract, contractimpl, panic_with_error, Address, Env, String};

pub use crate::types::{DataKey, PoolEvents, SavingsPool, MAX_NAME_LEN};
use crate::token::TokenClient;

/// Error codes for the community savings contract.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum SavingsError {
    /// Contract not initialized
    NotInitialized = 1,
    /// Pool name empty or too long
    InvalidName = 2,
    /// Amount must be positive
    InvalidAmount = 3,
    /// No pool with this id
    PoolNotFound = 4,
    /// Pool is closed
    PoolClosed = 5,
    /// Caller did not create the pool
    NotCreator = 6,
}

impl From<SavingsError> for soroban_sdk::Error {
    fn from(e: SavingsError) -> Self {
        soroban_sdk::Error::from_contract_error(e as u32)
    }
}

#[contract]
pub struct CommunitySavingsContract;

#[contractimpl]
impl CommunitySavingsContract {
    pub fn initialize(env: Env, admin: Address, token: Address) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("Contract already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage().instance().set(&DataKey::PoolCount, &0u32);
    }

    /// Opens a pool and returns its id.
    pub fn create_pool(env: Env, creator: Address, name: String, goal: i128) -> u32 {
        creator.require_auth();

        if name.len() == 0 || name.len() > MAX_NAME_LEN {
            panic_with_error!(&env, SavingsError::InvalidName);
        }
        if goal <= 0 {
            panic_with_error!(&env, SavingsError::InvalidAmount);
        }

        let pool_id = Self::pool_count(env.clone());
        let pool = SavingsPool {
            name,
            creator: creator.clone(),
            goal,
            balance: 0,
            active: true,
            members: 0,
        };
        env.storage().persistent().set(&DataKey::Pool(pool_id), &pool);
        env.storage()
            .instance()
            .set(&DataKey::PoolCount, &(pool_id + 1));

        PoolEvents::created(&env, pool_id, &creator, goal);
        pool_id
    }

    /// Pulls `amount` from `member` into the pool (requires a prior
    /// allowance).
    pub fn contribute(env: Env, member: Address, pool_id: u32, amount: i128) {
        member.require_auth();

        if amount <= 0 {
            panic_with_error!(&env, SavingsError::InvalidAmount);
        }
        let mut pool = Self::load(&env, pool_id);
        if !pool.active {
            panic_with_error!(&env, SavingsError::PoolClosed);
        }

        let contract = env.current_contract_address();
        Self::token_client(&env).transfer_from(&contract, &member, &contract, &amount);

        let key = DataKey::Contribution(pool_id, member.clone());
        let previous: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        if previous == 0 {
            pool.members += 1;
        }
        env.storage().persistent().set(&key, &(previous + amount));

        let reached_before = pool.balance >= pool.goal;
        pool.balance += amount;
        env.storage().persistent().set(&DataKey::Pool(pool_id), &pool);

        PoolEvents::contributed(&env, pool_id, &member, amount, pool.balance);
        if !reached_before && pool.balance >= pool.goal {
            PoolEvents::goal_reached(&env, pool_id, pool.balance);
        }
    }

    /// Closes the pool and pays the pooled balance to its creator.
    pub fn close_pool(env: Env, creator: Address, pool_id: u32) {
        creator.require_auth();

        let mut pool = Self::load(&env, pool_id);
        if pool.creator != creator {
            panic_with_error!(&env, SavingsError::NotCreator);
        }
        if !pool.active {
            panic_with_error!(&env, SavingsError::PoolClosed);
        }

        let payout = pool.balance;
        pool.active = false;
        pool.balance = 0;
        env.storage().persistent().set(&DataKey::Pool(pool_id), &pool);

        if payout > 0 {
            let contract = env.current_contract_address();
            Self::token_client(&env).transfer(&contract, &creator, &payout);
        }

        PoolEvents::closed(&env, pool_id, payout);
    }

    pub fn pool_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::PoolCount)
            .unwrap_or(0)
    }

    /// Returns `(name, goal, balance, active, members)`.
    pub fn get_pool(env: Env, pool_id: u32) -> (String, i128, i128, bool, u32) {
        let pool = Self::load(&env, pool_id);
        (pool.name, pool.goal, pool.balance, pool.active, pool.members)
    }

    /// Amount `member` has put into a pool.
    pub fn contribution_of(env: Env, pool_id: u32, member: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Contribution(pool_id, member))
            .unwrap_or(0)
    }

    fn load(env: &Env, pool_id: u32) -> SavingsPool {
        env.storage()
            .persistent()
            .get(&DataKey::Pool(pool_id))
            .unwrap_or_else(|| panic_with_error!(env, SavingsError::PoolNotFound))
    }

    fn token_client(env: &Env) -> TokenClient<'_> {
        let token: Address = env
            .storage()
            .instance()
            .get(&DataKey::Token)
            .unwrap_or_else(|| panic_with_error!(env, SavingsError::NotInitialized));
        TokenClient::new(env, &token)
    }
}

#[cfg(test)]
mod test;
