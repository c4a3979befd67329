//! Data types and events for the budget manager.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

/// Length of a budget period. `spent` starts over once a period elapses.
pub const BUDGET_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest accepted category name, in bytes.
pub const MAX_CATEGORY_LEN: u32 = 32;

/// A spending budget owned by one user for one category.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Budget {
    /// Spending limit for the current period (minor units)
    pub limit: i128,
    /// Amount spent in the current period (minor units)
    pub spent: i128,
    /// Ledger timestamp of the last period reset
    pub last_reset: u64,
    /// Category label, unique per user
    pub category: String,
}

/// Storage keys for the contract
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Budget by (owner, index)
    Budget(Address, u32),
    /// Number of budgets a user has created
    BudgetCount(Address),
    /// Category index lookup, used to keep one budget per category
    Category(Address, String),
}

pub struct BudgetEvents;

impl BudgetEvents {
    pub fn created(env: &Env, user: &Address, budget_id: u32, limit: i128) {
        let topics = (symbol_short!("budget"), symbol_short!("created"), user.clone());
        env.events().publish(topics, (budget_id, limit));
    }

    pub fn expense_recorded(env: &Env, user: &Address, budget_id: u32, amount: i128, spent: i128) {
        let topics = (symbol_short!("budget"), symbol_short!("expense"), user.clone());
        env.events().publish(topics, (budget_id, amount, spent));
    }

    pub fn period_reset(env: &Env, user: &Address, budget_id: u32, at: u64) {
        let topics = (symbol_short!("budget"), symbol_short!("reset"), user.clone());
        env.events().publish(topics, (budget_id, at));
    }

    pub fn limit_updated(env: &Env, user: &Address, budget_id: u32, limit: i128) {
        let topics = (symbol_short!("budget"), symbol_short!("limit"), user.clone());
        env.events().publish(topics, (budget_id, limit));
    }
}
