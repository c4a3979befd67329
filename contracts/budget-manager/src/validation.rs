//! Input validation for budget operations.

use soroban_sdk::String;

use crate::types::MAX_CATEGORY_LEN;

/// Validation error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyCategory,
    CategoryTooLong,
    InvalidAmount,
}

/// Category labels must be non-empty and at most `MAX_CATEGORY_LEN` bytes.
pub fn validate_category(category: &String) -> Result<(), ValidationError> {
    if category.len() == 0 {
        return Err(ValidationError::EmptyCategory);
    }
    if category.len() > MAX_CATEGORY_LEN {
        return Err(ValidationError::CategoryTooLong);
    }
    Ok(())
}

/// Limits and expenses must be strictly positive.
pub fn validate_amount(amount: i128) -> Result<(), ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(())
}
