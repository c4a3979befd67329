//! Data types, defaults and events for the loan book.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

/// One whole token in minor units (18 decimals).
pub const ONE_TOKEN: i128 = 1_000_000_000_000_000_000;

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Basis points in 100%.
pub const BPS_DENOMINATOR: i128 = 10_000;

pub const BASE_CREDIT_SCORE: i64 = 500;
pub const MIN_CREDIT_SCORE: i64 = 300;
pub const MAX_CREDIT_SCORE: i64 = 850;
/// Score gained per loan repaid on time.
pub const ON_TIME_BONUS: i64 = 25;
/// Score lost per loan repaid after its duration elapsed.
pub const LATE_PENALTY: i64 = 40;

/// A loan offer, and once taken, an outstanding loan.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    /// Principal in minor units
    pub amount: i128,
    /// Flat interest over the loan term, in basis points
    pub interest_rate: u32,
    /// Loan term in seconds
    pub duration: u64,
    /// Ledger timestamp when the loan was taken, 0 while open
    pub start_time: u64,
    /// `None` until someone takes the offer
    pub borrower: Option<Address>,
    pub lender: Address,
    pub active: bool,
    pub repaid: bool,
}

/// Bounds applied to new offers.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanConstraints {
    pub min_amount: i128,
    pub max_amount: i128,
    /// Basis points
    pub min_interest_rate: u32,
    /// Basis points
    pub max_interest_rate: u32,
    /// Seconds
    pub min_duration: u64,
    /// Seconds
    pub max_duration: u64,
}

impl LoanConstraints {
    pub fn default_bounds() -> Self {
        LoanConstraints {
            min_amount: ONE_TOKEN / 10,
            max_amount: 1_000 * ONE_TOKEN,
            min_interest_rate: 500,
            max_interest_rate: 5_000,
            min_duration: SECONDS_PER_DAY,
            max_duration: 365 * SECONDS_PER_DAY,
        }
    }
}

/// Repayment history used for the credit score.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CreditRecord {
    pub borrowed: u32,
    pub repaid_on_time: u32,
    pub repaid_late: u32,
}

/// Storage keys for the contract
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Token,
    Constraints,
    LoanCount,
    Loan(u32),
    Credit(Address),
}

pub struct LoanEvents;

impl LoanEvents {
    pub fn offered(env: &Env, loan_id: u32, lender: &Address, amount: i128, rate: u32) {
        let topics = (symbol_short!("loan"), symbol_short!("offered"), loan_id);
        env.events().publish(topics, (lender.clone(), amount, rate));
    }

    pub fn taken(env: &Env, loan_id: u32, borrower: &Address, at: u64) {
        let topics = (symbol_short!("loan"), symbol_short!("taken"), loan_id);
        env.events().publish(topics, (borrower.clone(), at));
    }

    pub fn repaid(env: &Env, loan_id: u32, borrower: &Address, total: i128, late: bool) {
        let topics = (symbol_short!("loan"), symbol_short!("repaid"), loan_id);
        env.events().publish(topics, (borrower.clone(), total, late));
    }

    pub fn cancelled(env: &Env, loan_id: u32, lender: &Address) {
        let topics = (symbol_short!("loan"), symbol_short!("cancel"), loan_id);
        env.events().publish(topics, lender.clone());
    }
}
