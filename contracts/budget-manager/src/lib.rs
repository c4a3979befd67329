//! # Budget Manager Contract
//!
//! A Soroban smart contract that keeps one spending budget per user and
//! category.
//!
//! ## Features
//!
//! - **Per-category budgets**: each user owns an indexed list of budgets
//! - **Periodic reset**: `spent` starts over every 30 days
//! - **Limit enforcement**: expenses that would exceed the limit are rejected
//! - **Event Emission**: tracks creation, expenses, resets and limit changes
//!
//! Budgets are returned as positional tuples `(limit, spent, last_reset,
//! category)` so clients can enumerate them by index.
#![no_std]

mod types;
mod validation;

use soroban_sdk::{contract, contractimpl, panic_with_error, Address, Env, String};

pub use crate::types::{Budget, BudgetEvents, DataKey, BUDGET_PERIOD_SECS, MAX_CATEGORY_LEN};
use crate::validation::{validate_amount, validate_category, ValidationError};

/// Error codes for the budget manager contract.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum BudgetError {
    /// Category label is empty
    EmptyCategory = 1,
    /// Category label is too long
    CategoryTooLong = 2,
    /// Amount must be positive
    InvalidAmount = 3,
    /// The user already has a budget for this category
    DuplicateCategory = 4,
    /// No budget at this index
    BudgetNotFound = 5,
    /// Expense would push spending over the limit
    BudgetExceeded = 6,
}

impl From<BudgetError> for soroban_sdk::Error {
    fn from(e: BudgetError) -> Self {
        soroban_sdk::Error::from_contract_error(e as u32)
    }
}

impl From<ValidationError> for BudgetError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::EmptyCategory => BudgetError::EmptyCategory,
            ValidationError::CategoryTooLong => BudgetError::CategoryTooLong,
            ValidationError::InvalidAmount => BudgetError::InvalidAmount,
        }
    }
}

#[contract]
pub struct BudgetManagerContract;

#[contractimpl]
impl BudgetManagerContract {
    /// Creates a budget for `category` and returns its index.
    ///
    /// # Arguments
    /// * `env` - The contract environment
    /// * `user` - Budget owner (must authorize)
    /// * `category` - Category label, unique per user
    /// * `limit` - Spending limit per period, in minor units
    pub fn create_budget(env: Env, user: Address, category: String, limit: i128) -> u32 {
        user.require_auth();

        if let Err(e) = validate_category(&category) {
            panic_with_error!(&env, BudgetError::from(e));
        }
        if let Err(e) = validate_amount(limit) {
            panic_with_error!(&env, BudgetError::from(e));
        }

        let category_key = DataKey::Category(user.clone(), category.clone());
        if env.storage().persistent().has(&category_key) {
            panic_with_error!(&env, BudgetError::DuplicateCategory);
        }

        let budget_id = Self::user_budget_count(env.clone(), user.clone());
        let budget = Budget {
            limit,
            spent: 0,
            last_reset: env.ledger().timestamp(),
            category,
        };

        env.storage()
            .persistent()
            .set(&DataKey::Budget(user.clone(), budget_id), &budget);
        env.storage().persistent().set(&category_key, &budget_id);
        env.storage()
            .persistent()
            .set(&DataKey::BudgetCount(user.clone()), &(budget_id + 1));

        BudgetEvents::created(&env, &user, budget_id, limit);
        budget_id
    }

    /// Records an expense against a budget.
    ///
    /// If the current period has elapsed, `spent` is reset first. Expenses
    /// that would exceed the limit are rejected.
    pub fn record_expense(env: Env, user: Address, budget_id: u32, amount: i128) {
        user.require_auth();

        if let Err(e) = validate_amount(amount) {
            panic_with_error!(&env, BudgetError::from(e));
        }

        let key = DataKey::Budget(user.clone(), budget_id);
        let mut budget = Self::load(&env, &key);

        let now = env.ledger().timestamp();
        if now >= budget.last_reset.saturating_add(BUDGET_PERIOD_SECS) {
            budget.spent = 0;
            budget.last_reset = now;
            BudgetEvents::period_reset(&env, &user, budget_id, now);
        }

        let spent = budget
            .spent
            .checked_add(amount)
            .unwrap_or_else(|| panic_with_error!(&env, BudgetError::InvalidAmount));
        if spent > budget.limit {
            panic_with_error!(&env, BudgetError::BudgetExceeded);
        }
        budget.spent = spent;

        env.storage().persistent().set(&key, &budget);
        BudgetEvents::expense_recorded(&env, &user, budget_id, amount, spent);
    }

    /// Changes the limit of an existing budget. The new limit may not be
    /// below what was already spent this period.
    pub fn update_limit(env: Env, user: Address, budget_id: u32, limit: i128) {
        user.require_auth();

        if let Err(e) = validate_amount(limit) {
            panic_with_error!(&env, BudgetError::from(e));
        }

        let key = DataKey::Budget(user.clone(), budget_id);
        let mut budget = Self::load(&env, &key);
        if limit < budget.spent {
            panic_with_error!(&env, BudgetError::BudgetExceeded);
        }
        budget.limit = limit;

        env.storage().persistent().set(&key, &budget);
        BudgetEvents::limit_updated(&env, &user, budget_id, limit);
    }

    /// Returns how many budgets `user` has created.
    pub fn user_budget_count(env: Env, user: Address) -> u32 {
        env.storage()
            .persistent()
            .get(&DataKey::BudgetCount(user))
            .unwrap_or(0)
    }

    /// Returns `(limit, spent, last_reset, category)` for a budget.
    pub fn get_budget(env: Env, user: Address, budget_id: u32) -> (i128, i128, u64, String) {
        let budget = Self::load(&env, &DataKey::Budget(user, budget_id));
        (budget.limit, budget.spent, budget.last_reset, budget.category)
    }

    fn load(env: &Env, key: &DataKey) -> Budget {
        env.storage()
            .persistent()
            .get(key)
            .unwrap_or_else(|| panic_with_error!(env, BudgetError::BudgetNotFound))
    }
}

#[cfg(test)]
mod test;
