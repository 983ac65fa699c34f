//! EIP-7702 delegation authorizations attached to a user operation.
//!
//! The delegate target is accepted under either `contractAddress` or
//! `address`; both spellings appear across protocol drafts. An object carrying
//! both keys matches neither layout and is rejected.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::primitives::{HexData, address, hex_data, hex_number, hex_number_as};
use crate::schema::{Issues, ObjectReader};

const DELEGATE_KEYS: [&str; 2] = ["contractAddress", "address"];
const SIGNATURE_KEYS: [&str; 6] = ["chainId", "nonce", "r", "s", "v", "yParity"];

/// Fully signed authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAuthorization {
    pub address: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub r: HexData,
    pub s: HexData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<U256>,
    pub y_parity: u8,
}

/// Authorization that may not be signed yet, as sent to estimation calls.
///
/// Missing fields are filled with the values a signer would be asked for:
/// chain id `1`, nonce `0`, zeroed `r`/`s` and parity `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialAuthorization {
    pub address: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub r: HexData,
    pub s: HexData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<U256>,
    pub y_parity: u8,
}

impl PartialAuthorization {
    /// Only hex well-formedness is checked, never the signature itself.
    pub fn has_signature(&self) -> bool {
        let zero = HexData::zeroed(32);
        self.r != zero || self.s != zero
    }
}

/// Tries each delegate key spelling in turn, keeping the issues of both.
fn parse_layouts<T>(
    value: &Value,
    path: &str,
    parse: impl Fn(&ObjectReader<'_>, &str) -> Result<T, ValidationError>,
) -> Result<T, ValidationError> {
    let mut issues = Issues::default();
    for key in DELEGATE_KEYS {
        let mut known = vec![key];
        known.extend(SIGNATURE_KEYS);
        let attempt = ObjectReader::closed(value, path, &known).and_then(|reader| parse(&reader, key));
        match attempt {
            Ok(authorization) => return Ok(authorization),
            Err(err) => issues.push(err.labelled(key)),
        }
    }
    Err(issues.into_error())
}

pub fn signed_authorization(value: &Value, path: &str) -> Result<SignedAuthorization, ValidationError> {
    parse_layouts(value, path, |reader, key| {
        Ok(SignedAuthorization {
            address: reader.required(key, address)?,
            chain_id: reader.required("chainId", hex_number_as::<u64>)?,
            nonce: reader.required("nonce", hex_number_as::<u64>)?,
            r: reader.required("r", hex_data)?,
            s: reader.required("s", hex_data)?,
            v: reader.optional("v", hex_number)?,
            y_parity: reader.required("yParity", hex_number_as::<u8>)?,
        })
    })
}

pub fn partial_authorization(value: &Value, path: &str) -> Result<PartialAuthorization, ValidationError> {
    parse_layouts(value, path, |reader, key| {
        Ok(PartialAuthorization {
            address: reader.required(key, address)?,
            chain_id: reader.or_placeholder("chainId", hex_number_as::<u64>, 1)?,
            nonce: reader.or_placeholder("nonce", hex_number_as::<u64>, 0)?,
            r: reader.or_placeholder("r", hex_data, HexData::zeroed(32))?,
            s: reader.or_placeholder("s", hex_data, HexData::zeroed(32))?,
            v: reader.optional("v", hex_number)?,
            y_parity: reader.or_placeholder("yParity", hex_number_as::<u8>, 0)?,
        })
    })
}
