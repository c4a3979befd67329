//! Display-ready entities built from decoded contract records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::SchemaError;
use crate::schema::{fields, Record};
use crate::types::{Address, TokenAmount};
use crate::units::{bps_to_percent, seconds_to_days, timestamp_to_utc};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub id: u32,
    pub category: String,
    pub limit: TokenAmount,
    pub spent: TokenAmount,
    pub last_reset: Option<DateTime<Utc>>,
}

impl Budget {
    pub fn from_record(id: u32, record: &Record) -> Result<Self, SchemaError> {
        Ok(Budget {
            id,
            category: record.text(fields::CATEGORY)?,
            limit: TokenAmount::from_minor(record.i128(fields::LIMIT)?),
            spent: TokenAmount::from_minor(record.i128(fields::SPENT)?),
            last_reset: timestamp_to_utc(record.u64(fields::LAST_RESET)?),
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.category.trim().is_empty()
    }

    pub fn remaining(&self) -> TokenAmount {
        self.limit.saturating_sub(self.spent)
    }

    pub fn is_over_limit(&self) -> bool {
        self.spent > self.limit
    }

    /// Spent as a percentage of the limit, two decimal places.
    pub fn utilization(&self) -> Decimal {
        percent_of(self.spent.minor(), self.limit.minor())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Loan {
    pub id: u32,
    pub amount: TokenAmount,
    /// Percent, e.g. `10` for 1000 bps
    pub interest_rate: Decimal,
    pub duration_days: Decimal,
    /// `None` until the loan is taken
    pub start_time: Option<DateTime<Utc>>,
    /// Zero address until the loan is taken
    pub borrower: Address,
    pub lender: Address,
    pub active: bool,
    pub repaid: bool,
}

impl Loan {
    pub fn from_record(id: u32, record: &Record) -> Result<Self, SchemaError> {
        let start = record.u64(fields::START_TIME)?;
        Ok(Loan {
            id,
            amount: TokenAmount::from_minor(record.i128(fields::AMOUNT)?),
            interest_rate: bps_to_percent(record.u32(fields::INTEREST_RATE)?),
            duration_days: seconds_to_days(record.u64(fields::DURATION)?),
            start_time: if start == 0 { None } else { timestamp_to_utc(start) },
            borrower: record.address(fields::BORROWER)?,
            lender: record.address(fields::LENDER)?,
            active: record.bool(fields::ACTIVE)?,
            repaid: record.bool(fields::REPAID)?,
        })
    }

    /// Open offer nobody has taken yet.
    pub fn is_available(&self) -> bool {
        self.borrower.is_zero()
    }

    pub fn is_borrowed_by(&self, account: &Address) -> bool {
        !self.borrower.is_zero() && &self.borrower == account
    }

    pub fn is_offered_by(&self, account: &Address) -> bool {
        &self.lender == account
    }
}

/// Loans split by the viewer's relation to them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoanBook {
    pub available: Vec<Loan>,
    pub borrowed: Vec<Loan>,
    pub offered: Vec<Loan>,
}

impl LoanBook {
    pub fn partition(loans: &[Loan], account: &Address) -> Self {
        LoanBook {
            available: loans.iter().filter(|l| l.is_available()).cloned().collect(),
            borrowed: loans
                .iter()
                .filter(|l| l.is_borrowed_by(account))
                .cloned()
                .collect(),
            offered: loans
                .iter()
                .filter(|l| l.is_offered_by(account))
                .cloned()
                .collect(),
        }
    }
}

/// Offer bounds published by the loan book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoanConstraints {
    pub min_amount: TokenAmount,
    pub max_amount: TokenAmount,
    pub min_interest_rate: Decimal,
    pub max_interest_rate: Decimal,
    pub min_duration_days: Decimal,
    pub max_duration_days: Decimal,
}

impl Default for LoanConstraints {
    fn default() -> Self {
        LoanConstraints {
            min_amount: TokenAmount::from_minor(10i128.pow(17)),
            max_amount: TokenAmount::tokens(1_000),
            min_interest_rate: Decimal::from(5),
            max_interest_rate: Decimal::from(50),
            min_duration_days: Decimal::ONE,
            max_duration_days: Decimal::from(365),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SavingsPool {
    pub id: u32,
    pub name: String,
    pub goal: TokenAmount,
    pub balance: TokenAmount,
    pub active: bool,
    pub members: u32,
}

impl SavingsPool {
    pub fn from_record(id: u32, record: &Record) -> Result<Self, SchemaError> {
        Ok(SavingsPool {
            id,
            name: record.text(fields::NAME)?,
            goal: TokenAmount::from_minor(record.i128(fields::GOAL)?),
            balance: TokenAmount::from_minor(record.i128(fields::BALANCE)?),
            active: record.bool(fields::ACTIVE)?,
            members: record.u32(fields::MEMBERS)?,
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Progress toward the goal in percent, capped at 100.
    pub fn progress(&self) -> Decimal {
        percent_of(self.balance.minor(), self.goal.minor()).min(Decimal::ONE_HUNDRED)
    }
}

/// `part / whole` in percent, truncated to two places.
fn percent_of(part: i128, whole: i128) -> Decimal {
    if whole <= 0 {
        return Decimal::ZERO;
    }
    let basis = part
        .checked_mul(10_000)
        .map(|scaled| scaled / whole)
        .unwrap_or(i128::MAX);
    Decimal::new(i64::try_from(basis).unwrap_or(i64::MAX), 2).normalize()
}
