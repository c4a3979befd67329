//! Wire-level types shared by the transport, wallet and gateway layers.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::UnitError;
use crate::units::{format_units, parse_units, TOKEN_DECIMALS};

/// A `0x`-prefixed, 20-byte hex account or contract address.
///
/// Stored lowercase so equality is case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parses `0x` followed by 40 hex digits.
    pub fn parse(input: &str) -> Option<Self> {
        let hex_part = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X"))?;
        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Address(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    /// The all-zero address; marks an unfilled loan borrower.
    pub fn zero() -> Self {
        Address(format!("0x{}", "0".repeat(40)))
    }

    /// Deterministic address for the `n`th locally created account.
    pub fn from_index(n: u64) -> Self {
        Address(format!("0x{:040x}", n))
    }

    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display form, `0x1234...abcd`.
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value).ok_or_else(|| format!("invalid address: {}", value))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Short display form of an address, `0x1234...abcd`.
pub fn format_address(address: &Address) -> String {
    address.short()
}

/// Transaction hash, `0x`-prefixed hex.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn from_digest(digest: &[u8]) -> Self {
        TxHash(format!("0x{}", hex::encode(digest)))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Argument or return value of a contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Unit,
    Bool(bool),
    U32(u32),
    U64(u64),
    I128(i128),
    Text(String),
    Address(Address),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            Value::U64(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U32(v) => Some(u64::from(*v)),
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::I128(v) => Some(*v),
            Value::U32(v) => Some(i128::from(*v)),
            Value::U64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Value::Address(a) => Some(a),
            _ => None,
        }
    }

    /// Whether this value can stand in for `shape`.
    pub fn matches(&self, shape: &Shape) -> bool {
        match (self, shape) {
            (Value::Unit, Shape::Unit)
            | (Value::Bool(_), Shape::Bool)
            | (Value::U32(_), Shape::U32)
            | (Value::U64(_), Shape::U64)
            | (Value::I128(_), Shape::I128)
            | (Value::Text(_), Shape::Text)
            | (Value::Address(_), Shape::Address)
            | (Value::Address(_), Shape::OptionalAddress) => true,
            (Value::Tuple(values), Shape::Tuple(shapes)) => {
                values.len() == shapes.len()
                    && values.iter().zip(shapes).all(|(v, s)| v.matches(s))
            }
            _ => false,
        }
    }
}

impl From<Address> for Value {
    fn from(address: Address) -> Self {
        Value::Address(address)
    }
}

impl From<&Address> for Value {
    fn from(address: &Address) -> Self {
        Value::Address(address.clone())
    }
}

impl From<TokenAmount> for Value {
    fn from(amount: TokenAmount) -> Self {
        Value::I128(amount.minor())
    }
}

/// Expected shape of a return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Unit,
    Bool,
    U32,
    U64,
    I128,
    Text,
    Address,
    /// An address that may be absent; absent decodes to [`Address::zero`].
    OptionalAddress,
    Tuple(Vec<Shape>),
}

/// Token amount in minor units.
///
/// Displays and serializes as a decimal string with [`TOKEN_DECIMALS`]
/// places of precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(i128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn from_minor(raw: i128) -> Self {
        TokenAmount(raw)
    }

    /// Whole tokens, e.g. `TokenAmount::tokens(100)`.
    pub fn tokens(whole: i64) -> Self {
        TokenAmount(i128::from(whole) * 10i128.pow(TOKEN_DECIMALS))
    }

    pub fn parse(input: &str) -> Result<Self, UnitError> {
        parse_units(input, TOKEN_DECIMALS).map(TokenAmount)
    }

    pub fn minor(self) -> i128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: TokenAmount) -> Self {
        TokenAmount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: TokenAmount) -> Self {
        TokenAmount(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.0, TOKEN_DECIMALS))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Raw balance plus its display form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub raw: i128,
    pub formatted: String,
}

impl From<TokenAmount> for TokenBalance {
    fn from(amount: TokenAmount) -> Self {
        TokenBalance {
            raw: amount.minor(),
            formatted: amount.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_normalizes_case() {
        let a = Address::parse("0xABCDEF0000000000000000000000000000001234").unwrap();
        assert_eq!(a.as_str(), "0xabcdef0000000000000000000000000000001234");
        assert!(Address::parse("0x1234").is_none());
        assert!(Address::parse("abcdef0000000000000000000000000000001234").is_none());
    }

    #[test]
    fn test_format_address() {
        let raw = format!("0x1234{}abcd", "0".repeat(32));
        let address = Address::parse(&raw).unwrap();
        assert_eq!(format_address(&address), "0x1234...abcd");
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::zero().is_zero());
        assert!(!Address::from_index(7).is_zero());
        assert_eq!(
            Address::from_index(7).as_str(),
            "0x0000000000000000000000000000000000000007"
        );
    }

    #[test]
    fn test_value_matches_shape() {
        let value = Value::Tuple(vec![Value::I128(1), Value::Address(Address::zero())]);
        assert!(value.matches(&Shape::Tuple(vec![Shape::I128, Shape::OptionalAddress])));
        assert!(!value.matches(&Shape::Tuple(vec![Shape::I128])));
    }

    #[test]
    fn test_token_amount_serializes_as_decimal() {
        let json = serde_json::to_string(&TokenAmount::tokens(100)).unwrap();
        assert_eq!(json, "\"100.0\"");
    }
}
