//! Data types and events for community savings pools.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

/// Longest accepted pool name, in bytes.
pub const MAX_NAME_LEN: u32 = 64;

/// A shared savings pool working towards a goal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SavingsPool {
    pub name: String,
    pub creator: Address,
    /// Target amount in minor units
    pub goal: i128,
    /// Amount contributed so far in minor units
    pub balance: i128,
    pub active: bool,
    /// Distinct contributing accounts
    pub members: u32,
}

/// Storage keys for the contract
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Token,
    PoolCount,
    Pool(u32),
    /// Contributed amount by (pool, member)
    Contribution(u32, Address),
}

pub struct PoolEvents;

impl PoolEvents {
    pub fn created(env: &Env, pool_id: u32, creator: &Address, goal: i128) {
        let topics = (symbol_short!("pool"), symbol_short!("created"), pool_id);
        env.events().publish(topics, (creator.clone(), goal));
    }

    pub fn contributed(env: &Env, pool_id: u32, member: &Address, amount: i128, balance: i128) {
        let topics = (symbol_short!("pool"), symbol_short!("contrib"), pool_id);
        env.events().publish(topics, (member.clone(), amount, balance));
    }

    pub fn goal_reached(env: &Env, pool_id: u32, balance: i128) {
        let topics = (symbol_short!("pool"), symbol_short!("goal"), pool_id);
        env.events().publish(topics, balance);
    }

    pub fn closed(env: &Env, pool_id: u32, payout: i128) {
        let topics = (symbol_short!("pool"), symbol_short!("closed"), pool_id);
        env.events().publish(topics, payout);
    }
}
