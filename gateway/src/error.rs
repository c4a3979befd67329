//! Error types for the CyberFi gateway
//!
//! Each layer has its own enum; everything converges on [`GatewayError`],
//! whose `Display` output is the message shown to the user.

use std::fmt;

use thiserror::Error;

use crate::types::{Address, TokenAmount, TxHash};

/// Errors raised by a [`ChainTransport`](crate::transport::ChainTransport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A read or simulated call failed remotely
    #[error("{0}")]
    Call(String),

    /// The node refused a submitted transaction
    #[error("{0}")]
    Rejected(String),

    /// Return value did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// No receipt for this hash
    #[error("Unknown transaction {0}")]
    UnknownTransaction(TxHash),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a [`WalletProvider`](crate::wallet::WalletProvider).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("No wallet provider found. Please install a wallet extension to use this application.")]
    NoProvider,

    #[error("No accounts found. Please unlock your wallet.")]
    NoAccounts,

    /// The user declined in the wallet UI
    #[error("User rejected the request")]
    UserRejected,

    /// Chain id the wallet does not know yet (EIP-3085 code 4902)
    #[error("Unrecognized chain id {0}")]
    UnknownChain(u64),

    #[error("Wallet error: {0}")]
    Provider(String),
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No address configured for {0}; set the environment variable or deploy the contracts")]
    MissingAddress(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Address manifest error: {0}")]
    Manifest(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Manifest(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Manifest(err.to_string())
    }
}

/// Token amount parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("Amounts cannot be negative")]
    Negative,

    #[error("At most {0} decimal places are supported")]
    TooPrecise(u32),

    #[error("Amount is too large")]
    Overflow,
}

/// Schema mismatches between a remote return value and an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{entity}: expected {expected} fields, got {actual}")]
    Arity {
        entity: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{entity}.{field}: unexpected value")]
    FieldType {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity}: missing field {field}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity}: duplicate field {field}")]
    DuplicateField {
        entity: &'static str,
        field: &'static str,
    },
}

/// User-facing classification of a failed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteFailure {
    InsufficientBalance,
    InsufficientAllowance,
    RejectedBySigner,
    InsufficientGasFunds,
    FaucetCooldown,
    Reverted(String),
    Other(String),
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteFailure::InsufficientBalance => {
                write!(f, "Insufficient token balance for this operation")
            }
            WriteFailure::InsufficientAllowance => {
                write!(f, "Token allowance too low. Please approve the amount first")
            }
            WriteFailure::RejectedBySigner => write!(f, "Transaction was rejected in the wallet"),
            WriteFailure::InsufficientGasFunds => {
                write!(f, "Insufficient funds to pay for gas")
            }
            WriteFailure::FaucetCooldown => {
                write!(f, "You need to wait 1 hour between token requests")
            }
            WriteFailure::Reverted(reason) => write!(f, "Transaction reverted: {}", reason),
            WriteFailure::Other(message) => write!(f, "Transaction failed: {}", message),
        }
    }
}

/// Maps raw error text from a signer or node to a [`WriteFailure`].
///
/// Matching is by substring, case-insensitive. Gas funding is checked before
/// token balance because node messages for both contain "insufficient".
pub fn classify_write_error(text: &str) -> WriteFailure {
    let lower = text.to_lowercase();

    if lower.contains("user rejected") || lower.contains("user denied") {
        WriteFailure::RejectedBySigner
    } else if lower.contains("insufficient funds for gas") || lower.contains("gas * price") {
        WriteFailure::InsufficientGasFunds
    } else if lower.contains("insufficient balance") || lower.contains("exceeds balance") {
        WriteFailure::InsufficientBalance
    } else if lower.contains("insufficient allowance") || lower.contains("exceeds allowance") {
        WriteFailure::InsufficientAllowance
    } else if lower.contains("wait before requesting") || lower.contains("faucet cooldown") {
        WriteFailure::FaucetCooldown
    } else if let Some(idx) = lower.find("execution reverted") {
        let reason = text[idx + "execution reverted".len()..]
            .trim_start_matches(':')
            .trim();
        if reason.is_empty() {
            WriteFailure::Reverted("no reason given".to_string())
        } else {
            WriteFailure::Reverted(reason.to_string())
        }
    } else {
        WriteFailure::Other(text.to_string())
    }
}

/// Gateway error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Wallet not connected. Please connect your wallet first.")]
    NotConnected,

    #[error("Contract service not initialized. Please connect your wallet first.")]
    NotInitialized,

    /// Local input validation; no remote call was made
    #[error("{0}")]
    Validation(String),

    #[error("{kind}")]
    Write { kind: WriteFailure, detail: String },

    #[error("Could not read the {entity} count: none of {tried:?} responded")]
    ProbeExhausted {
        entity: &'static str,
        tried: Vec<&'static str>,
    },

    #[error("Token approval did not take effect: expected allowance {expected}, found {actual}")]
    AllowanceMismatch {
        expected: TokenAmount,
        actual: TokenAmount,
    },

    #[error("Please wait {minutes} more minutes before requesting tokens again")]
    FaucetCooldown { minutes: u64 },

    #[error("No contract deployed at {0}")]
    ContractMissing(Address),

    #[error("Remote read failed: {0}")]
    Read(TransportError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid amount: {0}")]
    Unit(#[from] UnitError),
}

impl GatewayError {
    /// Builds a classified write failure from raw error text.
    pub fn write(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        GatewayError::Write {
            kind: classify_write_error(&detail),
            detail,
        }
    }

    pub fn write_kind(&self) -> Option<&WriteFailure> {
        match self {
            GatewayError::Write { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_signer_rejection() {
        assert_eq!(
            classify_write_error("MetaMask Tx Signature: User denied transaction signature."),
            WriteFailure::RejectedBySigner
        );
        assert_eq!(
            classify_write_error("User rejected the request"),
            WriteFailure::RejectedBySigner
        );
    }

    #[test]
    fn test_classify_gas_before_balance() {
        assert_eq!(
            classify_write_error("insufficient funds for gas * price + value"),
            WriteFailure::InsufficientGasFunds
        );
        assert_eq!(
            classify_write_error("execution reverted: insufficient balance"),
            WriteFailure::InsufficientBalance
        );
    }

    #[test]
    fn test_classify_faucet_cooldown() {
        let kind = classify_write_error("execution reverted: Please wait before requesting more tokens");
        assert_eq!(kind, WriteFailure::FaucetCooldown);
        assert_eq!(
            kind.to_string(),
            "You need to wait 1 hour between token requests"
        );
    }

    #[test]
    fn test_classify_revert_reason() {
        assert_eq!(
            classify_write_error("execution reverted: budget exceeded"),
            WriteFailure::Reverted("budget exceeded".to_string())
        );
        assert_eq!(
            classify_write_error("execution reverted"),
            WriteFailure::Reverted("no reason given".to_string())
        );
    }

    #[test]
    fn test_classify_generic() {
        let kind = classify_write_error("connection reset");
        assert_eq!(kind, WriteFailure::Other("connection reset".to_string()));
        assert_eq!(kind.to_string(), "Transaction failed: connection reset");
    }

    #[test]
    fn test_write_error_message() {
        let err = GatewayError::write("execution reverted: insufficient balance");
        assert_eq!(err.write_kind(), Some(&WriteFailure::InsufficientBalance));
        assert_eq!(
            err.to_string(),
            "Insufficient token balance for this operation"
        );
    }
}
