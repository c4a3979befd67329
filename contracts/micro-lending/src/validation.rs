//! Validation of loan offers against the configured bounds.

use crate::types::LoanConstraints;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidAmount,
    InvalidInterestRate,
    InvalidDuration,
}

pub fn validate_offer(
    bounds: &LoanConstraints,
    amount: i128,
    interest_rate: u32,
    duration: u64,
) -> Result<(), ValidationError> {
    if amount < bounds.min_amount || amount > bounds.max_amount {
        return Err(ValidationError::InvalidAmount);
    }
    if interest_rate < bounds.min_interest_rate || interest_rate > bounds.max_interest_rate {
        return Err(ValidationError::InvalidInterestRate);
    }
    if duration < bounds.min_duration || duration > bounds.max_duration {
        return Err(ValidationError::InvalidDuration);
    }
    Ok(())
}

/// Bounds must be non-empty ranges with a positive minimum amount.
pub fn validate_bounds(bounds: &LoanConstraints) -> Result<(), ValidationError> {
    if bounds.min_amount <= 0 || bounds.min_amount > bounds.max_amount {
        return Err(ValidationError::InvalidAmount);
    }
    if bounds.min_interest_rate > bounds.max_interest_rate {
        return Err(ValidationError::InvalidInterestRate);
    }
    if bounds.min_duration == 0 || bounds.min_duration > bounds.max_duration {
        return Err(ValidationError::InvalidDuration);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ONE_TOKEN, SECONDS_PER_DAY};

    #[test]
    fn test_validate_offer_bounds() {
        let bounds = LoanConstraints::default_bounds();
        assert!(validate_offer(&bounds, ONE_TOKEN, 1_000, 30 * SECONDS_PER_DAY).is_ok());
        assert_eq!(
            validate_offer(&bounds, ONE_TOKEN / 100, 1_000, 30 * SECONDS_PER_DAY),
            Err(ValidationError::InvalidAmount)
        );
        assert_eq!(
            validate_offer(&bounds, ONE_TOKEN, 100, 30 * SECONDS_PER_DAY),
            Err(ValidationError::InvalidInterestRate)
        );
        assert_eq!(
            validate_offer(&bounds, ONE_TOKEN, 1_000, 400 * SECONDS_PER_DAY),
            Err(ValidationError::InvalidDuration)
        );
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds(&LoanConstraints::default_bounds()).is_ok());

        let mut bounds = LoanConstraints::default_bounds();
        bounds.min_interest_rate = 6_000;
        assert_eq!(
            validate_bounds(&bounds),
            Err(ValidationError::InvalidInterestRate)
        );
    }
}
