//! Coercers from loosely typed wire values into canonical scalars.
//!
//! Every coercer takes a raw JSON value and either returns the canonical form
//! or a human readable message; locating the failure is left to the caller.

use std::fmt;

use alloy_primitives::{Address, Bytes, U256, hex};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

const INVALID_BIGINT: &str = "Invalid input, expected a value that can be converted to bigint.";

/// Lower-cased `0x` prefixed hex string.
///
/// Odd length strings are valid hex data on the wire, so this is kept as text
/// rather than decoded eagerly into [`Bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexData(String);

impl HexData {
    pub fn empty() -> Self {
        Self("0x".to_string())
    }

    /// `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self(format!("0x{}", "00".repeat(len)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 2
    }

    pub fn to_bytes(&self) -> Result<Bytes, hex::FromHexError> {
        hex::decode(&self.0[2..]).map(Bytes::from)
    }
}

impl Default for HexData {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for HexData {
    fn from(bytes: Bytes) -> Self {
        Self(bytes.to_string())
    }
}

impl fmt::Display for HexData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for HexData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Name of the JSON type, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_str<'a>(value: &'a Value) -> Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("Expected string, received {}", type_name(value)))
}

fn is_hex_data(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// `0x` followed by exactly 40 hex digits in any case, returned checksummed.
pub fn address(value: &Value) -> Result<Address, String> {
    let s = expect_str(value)?;
    if s.len() != 42 || !is_hex_data(s) {
        return Err("not a valid hex address".to_string());
    }
    s.parse::<Address>()
        .map_err(|_| "not a valid hex address".to_string())
}

/// `0x` followed by zero or more hex digits, returned lower-cased.
pub fn hex_data(value: &Value) -> Result<HexData, String> {
    let s = expect_str(value)?;
    if !is_hex_data(s) {
        return Err("not valid hex data".to_string());
    }
    Ok(HexData(s.to_ascii_lowercase()))
}

/// A `0x` string or a JSON number, returned as a 256-bit unsigned integer.
pub fn hex_number(value: &Value) -> Result<U256, String> {
    match value {
        Value::String(s) => {
            if !is_hex_data(s) {
                return Err("not valid hex data".to_string());
            }
            let digits = &s[2..];
            if digits.is_empty() {
                return Err(INVALID_BIGINT.to_string());
            }
            U256::from_str_radix(digits, 16).map_err(|_| INVALID_BIGINT.to_string())
        }
        Value::Number(n) => number_to_u256(n).ok_or_else(|| INVALID_BIGINT.to_string()),
        other => Err(format!(
            "Expected string or number, received {}",
            type_name(other)
        )),
    }
}

/// [`hex_number`] narrowed to a native integer.
pub fn hex_number_as<T: TryFrom<U256>>(value: &Value) -> Result<T, String> {
    let number = hex_number(value)?;
    T::try_from(number).map_err(|_| format!("Number {number} is too large"))
}

/// Largest magnitude a double holds without losing integer precision.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn number_to_u256(n: &Number) -> Option<U256> {
    if let Some(u) = n.as_u64() {
        return Some(U256::from(u));
    }
    if n.is_i64() {
        return None;
    }
    n.as_f64().and_then(float_to_u256)
}

/// Integral, non-negative doubles below 2^53. Anything larger may already
/// have been rounded by the JSON parser.
fn float_to_u256(f: f64) -> Option<U256> {
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 || f >= MAX_EXACT_FLOAT {
        return None;
    }
    Some(U256::from(f as u64))
}
