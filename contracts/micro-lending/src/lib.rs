//! # Micro Lending Contract
//!
//! A peer-to-peer loan book. Lenders escrow a principal as an open offer;
//! a borrower takes the offer and later repays principal plus flat interest
//! directly to the lender.
//!
//! ## Loan lifecycle
//!
//! - **Offered**: `active`, no borrower
//! - **Taken**: `active`, borrower set, `start_time` set
//! - **Repaid**: `repaid`, no longer `active`
//! - **Cancelled**: an untaken offer withdrawn by its lender; the entry is
//!   removed and the principal refunded
//!
//! Repayment history feeds a simple credit score per account.
#![no_std]

mod token;
mod types;
mod validation;

use soroban_sdk::{contract, contractimpl, panic_with_error, Address, Env};

pub use crate::types::{
    CreditRecord, DataKey, Loan, LoanConstraints, LoanEvents, BASE_CREDIT_SCORE, BPS_DENOMINATOR,
    LATE_PENALTY, MAX_CREDIT_SCORE, MIN_CREDIT_SCORE, ONE_TOKEN, ON_TIME_BONUS, SECONDS_PER_DAY,
};
use crate::token::TokenClient;
use crate::validation::{validate_bounds, validate_offer, ValidationError};

/// Error codes for the micro lending contract.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum LendingError {
    /// Contract not initialized
    NotInitialized = 1,
    /// Caller is not the admin
    Unauthorized = 2,
    /// Amount outside the allowed range
    InvalidAmount = 3,
    /// Interest rate outside the allowed range
    InvalidInterestRate = 4,
    /// Duration outside the allowed range
    InvalidDuration = 5,
    /// No loan with this id
    LoanNotFound = 6,
    /// Loan already taken or closed
    LoanUnavailable = 7,
    /// Caller is not the loan's borrower
    NotBorrower = 8,
    /// Caller is not the loan's lender
    NotLender = 9,
    /// Lenders cannot take their own offers
    SelfBorrow = 10,
}

impl From<LendingError> for soroban_sdk::Error {
    fn from(e: LendingError) -> Self {
        soroban_sdk::Error::from_contract_error(e as u32)
    }
}

impl From<ValidationError> for LendingError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::InvalidAmount => LendingError::InvalidAmount,
            ValidationError::InvalidInterestRate => LendingError::InvalidInterestRate,
            ValidationError::InvalidDuration => LendingError::InvalidDuration,
        }
    }
}

#[contract]
pub struct MicroLendingContract;

#[contractimpl]
impl MicroLendingContract {
    /// Initializes the loan book for `token` with default offer bounds.
    pub fn initialize(env: Env, admin: Address, token: Address) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("Contract already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage()
            .instance()
            .set(&DataKey::Constraints, &LoanConstraints::default_bounds());
        env.storage().instance().set(&DataKey::LoanCount, &0u32);
    }

    /// Replaces the offer bounds. Admin only.
    pub fn set_constraints(env: Env, admin: Address, bounds: LoanConstraints) {
        admin.require_auth();
        Self::require_admin(&env, &admin);
        if let Err(e) = validate_bounds(&bounds) {
            panic_with_error!(&env, LendingError::from(e));
        }
        env.storage().instance().set(&DataKey::Constraints, &bounds);
    }

    /// Escrows `amount` from `lender` (requires a prior allowance) and opens
    /// an offer. Returns the new loan id.
    ///
    /// # Arguments
    /// * `lender` - Offer owner (must authorize)
    /// * `amount` - Principal in minor units
    /// * `interest_rate` - Flat interest in basis points
    /// * `duration` - Term in seconds
    pub fn offer_loan(
        env: Env,
        lender: Address,
        amount: i128,
        interest_rate: u32,
        duration: u64,
    ) -> u32 {
        lender.require_auth();

        let bounds = Self::constraints(&env);
        if let Err(e) = validate_offer(&bounds, amount, interest_rate, duration) {
            panic_with_error!(&env, LendingError::from(e));
        }

        let contract = env.current_contract_address();
        Self::token_client(&env).transfer_from(&contract, &lender, &contract, &amount);

        let loan_id = Self::loan_count(env.clone());
        let loan = Loan {
            amount,
            interest_rate,
            duration,
            start_time: 0,
            borrower: None,
            lender: lender.clone(),
            active: true,
            repaid: false,
        };
        env.storage().persistent().set(&DataKey::Loan(loan_id), &loan);
        env.storage()
            .instance()
            .set(&DataKey::LoanCount, &(loan_id + 1));

        LoanEvents::offered(&env, loan_id, &lender, amount, interest_rate);
        loan_id
    }

    /// Takes an open offer; the principal is paid out to `borrower`.
    pub fn take_loan(env: Env, borrower: Address, loan_id: u32) {
        borrower.require_auth();

        let mut loan = Self::load(&env, loan_id);
        if !loan.active || loan.borrower.is_some() {
            panic_with_error!(&env, LendingError::LoanUnavailable);
        }
        if loan.lender == borrower {
            panic_with_error!(&env, LendingError::SelfBorrow);
        }

        let now = env.ledger().timestamp();
        loan.borrower = Some(borrower.clone());
        loan.start_time = now;
        env.storage().persistent().set(&DataKey::Loan(loan_id), &loan);

        let mut record = Self::credit_record(&env, &borrower);
        record.borrowed += 1;
        env.storage()
            .persistent()
            .set(&DataKey::Credit(borrower.clone()), &record);

        let contract = env.current_contract_address();
        Self::token_client(&env).transfer(&contract, &borrower, &loan.amount);

        LoanEvents::taken(&env, loan_id, &borrower, now);
    }

    /// Repays principal plus interest to the lender (requires the borrower to
    /// have approved this contract for `amount_due`).
    pub fn repay_loan(env: Env, borrower: Address, loan_id: u32) {
        borrower.require_auth();

        let mut loan = Self::load(&env, loan_id);
        if loan.borrower.as_ref() != Some(&borrower) {
            panic_with_error!(&env, LendingError::NotBorrower);
        }
        if !loan.active || loan.repaid {
            panic_with_error!(&env, LendingError::LoanUnavailable);
        }

        let total = Self::total_due(&loan);
        let contract = env.current_contract_address();
        Self::token_client(&env).transfer_from(&contract, &borrower, &loan.lender, &total);

        let late = env.ledger().timestamp() > loan.start_time.saturating_add(loan.duration);
        loan.active = false;
        loan.repaid = true;
        env.storage().persistent().set(&DataKey::Loan(loan_id), &loan);

        let mut record = Self::credit_record(&env, &borrower);
        if late {
            record.repaid_late += 1;
        } else {
            record.repaid_on_time += 1;
        }
        env.storage()
            .persistent()
            .set(&DataKey::Credit(borrower.clone()), &record);

        LoanEvents::repaid(&env, loan_id, &borrower, total, late);
    }

    /// Withdraws an untaken offer. The entry is removed and the principal
    /// refunded to the lender.
    pub fn cancel_loan(env: Env, lender: Address, loan_id: u32) {
        lender.require_auth();

        let loan = Self::load(&env, loan_id);
        if loan.lender != lender {
            panic_with_error!(&env, LendingError::NotLender);
        }
        if !loan.active || loan.borrower.is_some() {
            panic_with_error!(&env, LendingError::LoanUnavailable);
        }

        env.storage().persistent().remove(&DataKey::Loan(loan_id));

        let contract = env.current_contract_address();
        Self::token_client(&env).transfer(&contract, &lender, &loan.amount);

        LoanEvents::cancelled(&env, loan_id, &lender);
    }

    /// Number of loan ids ever issued. Cancelled ids stay counted.
    pub fn loan_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::LoanCount)
            .unwrap_or(0)
    }

    /// Returns `(amount, interest_rate, duration, start_time, borrower,
    /// lender, active, repaid)`.
    #[allow(clippy::type_complexity)]
    pub fn loans(
        env: Env,
        loan_id: u32,
    ) -> (i128, u32, u64, u64, Option<Address>, Address, bool, bool) {
        let loan = Self::load(&env, loan_id);
        (
            loan.amount,
            loan.interest_rate,
            loan.duration,
            loan.start_time,
            loan.borrower,
            loan.lender,
            loan.active,
            loan.repaid,
        )
    }

    /// Principal plus interest owed on repayment.
    pub fn amount_due(env: Env, loan_id: u32) -> i128 {
        Self::total_due(&Self::load(&env, loan_id))
    }

    /// Score in `[MIN_CREDIT_SCORE, MAX_CREDIT_SCORE]`.
    pub fn credit_score(env: Env, user: Address) -> u32 {
        let record = Self::credit_record(&env, &user);
        let score = BASE_CREDIT_SCORE + ON_TIME_BONUS * record.repaid_on_time as i64
            - LATE_PENALTY * record.repaid_late as i64;
        score.clamp(MIN_CREDIT_SCORE, MAX_CREDIT_SCORE) as u32
    }

    pub fn min_loan_amount(env: Env) -> i128 {
        Self::constraints(&env).min_amount
    }

    pub fn max_loan_amount(env: Env) -> i128 {
        Self::constraints(&env).max_amount
    }

    pub fn min_interest_rate(env: Env) -> u32 {
        Self::constraints(&env).min_interest_rate
    }

    pub fn max_interest_rate(env: Env) -> u32 {
        Self::constraints(&env).max_interest_rate
    }

    pub fn min_loan_duration(env: Env) -> u64 {
        Self::constraints(&env).min_duration
    }

    pub fn max_loan_duration(env: Env) -> u64 {
        Self::constraints(&env).max_duration
    }

    fn total_due(loan: &Loan) -> i128 {
        loan.amount + loan.amount * loan.interest_rate as i128 / BPS_DENOMINATOR
    }

    fn load(env: &Env, loan_id: u32) -> Loan {
        env.storage()
            .persistent()
            .get(&DataKey::Loan(loan_id))
            .unwrap_or_else(|| panic_with_error!(env, LendingError::LoanNotFound))
    }

    fn credit_record(env: &Env, user: &Address) -> CreditRecord {
        env.storage()
            .persistent()
            .get(&DataKey::Credit(user.clone()))
            .unwrap_or_default()
    }

    fn constraints(env: &Env) -> LoanConstraints {
        env.storage()
            .instance()
            .get(&DataKey::Constraints)
            .unwrap_or_else(|| panic_with_error!(env, LendingError::NotInitialized))
    }

    fn token_client(env: &Env) -> TokenClient<'_> {
        let token: Address = env
            .storage()
            .instance()
            .get(&DataKey::Token)
            .unwrap_or_else(|| panic_with_error!(env, LendingError::NotInitialized));
        TokenClient::new(env, &token)
    }

    fn require_admin(env: &Env, caller: &Address) {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("Contract not initialized");

        if *caller != admin {
            panic_with_error!(env, LendingError::Unauthorized);
        }
    }
}
