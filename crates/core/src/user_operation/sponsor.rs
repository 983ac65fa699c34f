//! User operations as sent to `pm_sponsorUserOperation`.
//!
//! Gas limits the caller has not estimated yet default to `1`. Byte fields a
//! paymaster is about to fill (`paymasterAndData`, `signature`) default to
//! `0x`.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use serde_json::Value;

use super::{EntryPointVersion, Factory, V06_KEYS, V07_KEYS, factory};
use crate::authorization::{SignedAuthorization, signed_authorization};
use crate::error::ValidationError;
use crate::primitives::{HexData, address, hex_data, hex_number};
use crate::resolver::{Candidate, OperationFamily, resolve};
use crate::schema::ObjectReader;

/// Placeholder for a gas value that was not estimated yet.
pub const NOT_ESTIMATED: U256 = U256::from_limbs([1, 0, 0, 0]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV06 {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: HexData,
    pub call_data: HexData,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub paymaster_and_data: HexData,
    pub signature: HexData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eip7702_auth: Option<SignedAuthorization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV07 {
    pub sender: Address,
    pub nonce: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<HexData>,
    pub call_data: HexData,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<HexData>,
    pub signature: HexData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eip7702_auth: Option<SignedAuthorization>,
}

/// Same layout as v0.7, with `factory` also accepting the EIP-7702 literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV08 {
    pub sender: Address,
    pub nonce: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory: Option<Factory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<HexData>,
    pub call_data: HexData,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<HexData>,
    pub signature: HexData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eip7702_auth: Option<SignedAuthorization>,
}

/// A sponsor call's user operation, tagged with the version it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserOperation {
    V06(UserOperationV06),
    V07(UserOperationV07),
    V08(UserOperationV08),
}

impl UserOperation {
    pub fn parse(value: &Value, path: &str) -> Result<Self, ValidationError> {
        resolve::<Sponsor>(value, path)
    }

    pub const fn version(&self) -> EntryPointVersion {
        match self {
            Self::V06(_) => EntryPointVersion::V06,
            Self::V07(_) => EntryPointVersion::V07,
            Self::V08(_) => EntryPointVersion::V08,
        }
    }

    pub const fn sender(&self) -> Address {
        match self {
            Self::V06(op) => op.sender,
            Self::V07(op) => op.sender,
            Self::V08(op) => op.sender,
        }
    }

    pub const fn nonce(&self) -> U256 {
        match self {
            Self::V06(op) => op.nonce,
            Self::V07(op) => op.nonce,
            Self::V08(op) => op.nonce,
        }
    }
}

/// `0x` hex data, or the empty string standing for `0x`.
fn hex_data_or_blank(value: &Value) -> Result<HexData, String> {
    if value.as_str() == Some("") {
        return Ok(HexData::empty());
    }
    hex_data(value)
}

fn parse_v06(value: &Value, path: &str) -> Result<UserOperation, ValidationError> {
    let reader = ObjectReader::closed(value, path, &V06_KEYS)?;
    Ok(UserOperation::V06(UserOperationV06 {
        sender: reader.required("sender", address)?,
        nonce: reader.required("nonce", hex_number)?,
        init_code: reader.required("initCode", hex_data)?,
        call_data: reader.required("callData", hex_data)?,
        call_gas_limit: reader.or_placeholder("callGasLimit", hex_number, NOT_ESTIMATED)?,
        verification_gas_limit: reader.or_placeholder("verificationGasLimit", hex_number, NOT_ESTIMATED)?,
        pre_verification_gas: reader.or_placeholder("preVerificationGas", hex_number, NOT_ESTIMATED)?,
        max_priority_fee_per_gas: reader.required("maxPriorityFeePerGas", hex_number)?,
        max_fee_per_gas: reader.required("maxFeePerGas", hex_number)?,
        paymaster_and_data: reader.or_placeholder("paymasterAndData", hex_data_or_blank, HexData::empty())?,
        signature: reader.or_placeholder("signature", hex_data_or_blank, HexData::empty())?,
        eip7702_auth: reader.nullable_nested("eip7702Auth", signed_authorization)?,
    }))
}

fn parse_v07(value: &Value, path: &str) -> Result<UserOperation, ValidationError> {
    let reader = ObjectReader::closed(value, path, &V07_KEYS)?;
    Ok(UserOperation::V07(UserOperationV07 {
        sender: reader.required("sender", address)?,
        nonce: reader.required("nonce", hex_number)?,
        factory: reader.nullable("factory", address)?,
        factory_data: reader.nullable("factoryData", hex_data)?,
        call_data: reader.required("callData", hex_data)?,
        call_gas_limit: reader.or_placeholder("callGasLimit", hex_number, NOT_ESTIMATED)?,
        verification_gas_limit: reader.or_placeholder("verificationGasLimit", hex_number, NOT_ESTIMATED)?,
        pre_verification_gas: reader.or_placeholder("preVerificationGas", hex_number, NOT_ESTIMATED)?,
        max_fee_per_gas: reader.required("maxFeePerGas", hex_number)?,
        max_priority_fee_per_gas: reader.required("maxPriorityFeePerGas", hex_number)?,
        paymaster: reader.nullable("paymaster", address)?,
        paymaster_verification_gas_limit: reader.nullable("paymasterVerificationGasLimit", hex_number)?,
        paymaster_post_op_gas_limit: reader.nullable("paymasterPostOpGasLimit", hex_number)?,
        paymaster_data: reader.nullable("paymasterData", hex_data)?,
        signature: reader.or_placeholder("signature", hex_data, HexData::empty())?,
        eip7702_auth: reader.nullable_nested("eip7702Auth", signed_authorization)?,
    }))
}

fn parse_v08(value: &Value, path: &str) -> Result<UserOperation, ValidationError> {
    let reader = ObjectReader::closed(value, path, &V07_KEYS)?;
    Ok(UserOperation::V08(UserOperationV08 {
        sender: reader.required("sender", address)?,
        nonce: reader.required("nonce", hex_number)?,
        factory: reader.nullable("factory", factory)?,
        factory_data: reader.nullable("factoryData", hex_data)?,
        call_data: reader.required("callData", hex_data)?,
        call_gas_limit: reader.or_placeholder("callGasLimit", hex_number, NOT_ESTIMATED)?,
        verification_gas_limit: reader.or_placeholder("verificationGasLimit", hex_number, NOT_ESTIMATED)?,
        pre_verification_gas: reader.or_placeholder("preVerificationGas", hex_number, NOT_ESTIMATED)?,
        max_fee_per_gas: reader.required("maxFeePerGas", hex_number)?,
        max_priority_fee_per_gas: reader.required("maxPriorityFeePerGas", hex_number)?,
        paymaster: reader.nullable("paymaster", address)?,
        paymaster_verification_gas_limit: reader.nullable("paymasterVerificationGasLimit", hex_number)?,
        paymaster_post_op_gas_limit: reader.nullable("paymasterPostOpGasLimit", hex_number)?,
        paymaster_data: reader.nullable("paymasterData", hex_data)?,
        signature: reader.or_placeholder("signature", hex_data, HexData::empty())?,
        eip7702_auth: reader.nullable_nested("eip7702Auth", signed_authorization)?,
    }))
}

/// Schema family of `pm_sponsorUserOperation`.
#[derive(Debug, Clone, Copy)]
pub struct Sponsor;

impl OperationFamily for Sponsor {
    type Operation = UserOperation;

    const CANDIDATES: &'static [Candidate<UserOperation>] = &[
        Candidate { version: EntryPointVersion::V06, parse: parse_v06 },
        Candidate { version: EntryPointVersion::V07, parse: parse_v07 },
        Candidate { version: EntryPointVersion::V08, parse: parse_v08 },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    fn v06_json() -> Value {
        json!({
            "sender": "0xabc0000000000000000000000000000000000001",
            "nonce": "0x1",
            "initCode": "0x",
            "callData": "0x",
            "maxPriorityFeePerGas": "0x1",
            "maxFeePerGas": "0x1"
        })
    }

    fn v07_json() -> Value {
        json!({
            "sender": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "nonce": "0x1",
            "factory": "0x2222222222222222222222222222222222222222",
            "factoryData": "0xABCDEF",
            "callData": "0xb61d27f6",
            "callGasLimit": "0x2dc6c0",
            "verificationGasLimit": "0x1e8480",
            "preVerificationGas": "0x186a0",
            "maxFeePerGas": "0x77359400",
            "maxPriorityFeePerGas": "0x3b9aca00",
            "signature": "0x01"
        })
    }

    fn eip7702_auth_json() -> Value {
        json!({
            "address": "0xe6cae83bde06e4c305530e199d7217f42808555b",
            "chainId": "0x7a69",
            "nonce": "0x0",
            "r": "0x01",
            "s": "0x02",
            "yParity": "0x0"
        })
    }

    #[test]
    fn test_v06_defaults() {
        let op = UserOperation::parse(&v06_json(), "0").unwrap();
        assert_eq!(op.version(), EntryPointVersion::V06);
        let UserOperation::V06(op) = op else {
            panic!("Expected v0.6");
        };
        assert_eq!(op.sender, address!("abc0000000000000000000000000000000000001"));
        assert_eq!(op.call_gas_limit, U256::from(1));
        assert_eq!(op.verification_gas_limit, U256::from(1));
        assert_eq!(op.pre_verification_gas, U256::from(1));
        assert_eq!(op.paymaster_and_data, HexData::empty());
        assert_eq!(op.signature, HexData::empty());
        assert_eq!(op.eip7702_auth, None);
    }

    #[test]
    fn test_v06_blank_strings_become_empty_data() {
        let mut value = v06_json();
        value["paymasterAndData"] = json!("");
        value["signature"] = json!("");
        let UserOperation::V06(op) = UserOperation::parse(&value, "0").unwrap() else {
            panic!("Expected v0.6");
        };
        assert_eq!(op.paymaster_and_data.as_str(), "0x");
        assert_eq!(op.signature.as_str(), "0x");
    }

    #[test]
    fn test_v06_keeps_supplied_gas() {
        let mut value = v06_json();
        value["callGasLimit"] = json!(21000);
        let UserOperation::V06(op) = UserOperation::parse(&value, "0").unwrap() else {
            panic!("Expected v0.6");
        };
        assert_eq!(op.call_gas_limit, U256::from(21000));
    }

    #[test]
    fn test_v07_resolution() {
        let op = UserOperation::parse(&v07_json(), "0").unwrap();
        let UserOperation::V07(op) = op else {
            panic!("Expected v0.7");
        };
        assert_eq!(op.factory, Some(address!("2222222222222222222222222222222222222222")));
        assert_eq!(op.factory_data.unwrap().as_str(), "0xabcdef");
        assert_eq!(op.paymaster, None);
        assert_eq!(op.paymaster_verification_gas_limit, None);
        assert_eq!(op.signature.as_str(), "0x01");
    }

    #[test]
    fn test_v07_null_optionals() {
        let mut value = v07_json();
        value["paymaster"] = Value::Null;
        value["factory"] = Value::Null;
        value.as_object_mut().unwrap().remove("signature");
        let UserOperation::V07(op) = UserOperation::parse(&value, "0").unwrap() else {
            panic!("Expected v0.7");
        };
        assert_eq!(op.factory, None);
        assert_eq!(op.paymaster, None);
        assert_eq!(op.signature, HexData::empty());
    }

    #[test]
    fn test_eip7702_factory_resolves_v08() {
        let mut value = v07_json();
        value["factory"] = json!("0x7702");
        value["eip7702Auth"] = eip7702_auth_json();
        let op = UserOperation::parse(&value, "0").unwrap();
        assert_eq!(op.version(), EntryPointVersion::V08);
        let UserOperation::V08(op) = op else {
            panic!("Expected v0.8");
        };
        assert_eq!(op.factory, Some(Factory::Eip7702));
        assert_eq!(op.eip7702_auth.unwrap().chain_id, 31337);
    }

    #[test]
    fn test_v06_never_resolves_as_v07() {
        let op = UserOperation::parse(&v06_json(), "0").unwrap();
        assert!(matches!(op, UserOperation::V06(_)));
    }

    #[test]
    fn test_unknown_key_rejected_for_every_version() {
        for mut value in [v06_json(), v07_json()] {
            value["bogus"] = json!("0x");
            let err = UserOperation::parse(&value, "0").unwrap_err();
            assert_eq!(err.issues().len(), 3);
            assert!(err.issues().iter().all(|issue| issue.message.contains("'bogus'")));
        }
    }

    #[test]
    fn test_failure_names_each_version() {
        let mut value = v07_json();
        value["sender"] = json!("0x123");
        let err = UserOperation::parse(&value, "0").unwrap_err();
        let messages: Vec<_> = err.issues().iter().map(|i| i.message.as_str()).collect();
        assert!(messages[0].starts_with("[v0.6] Unrecognized key(s)"));
        assert_eq!(messages[1], "[v0.7] not a valid hex address");
        assert_eq!(messages[2], "[v0.8] not a valid hex address");
        assert_eq!(err.issues()[1].path, "0.sender");
    }

    #[test]
    fn test_missing_required_field() {
        let mut value = v06_json();
        value.as_object_mut().unwrap().remove("maxFeePerGas");
        let err = UserOperation::parse(&value, "0").unwrap_err();
        assert_eq!(err.issues()[0].message, "[v0.6] Required");
        assert_eq!(err.issues()[0].path, "0.maxFeePerGas");
    }

    #[test]
    fn test_round_trip() {
        let mut with_auth = v07_json();
        with_auth["factory"] = json!("0x7702");
        with_auth["eip7702Auth"] = eip7702_auth_json();
        for value in [v06_json(), v07_json(), with_auth] {
            let op = UserOperation::parse(&value, "0").unwrap();
            let encoded = serde_json::to_value(&op).unwrap();
            assert_eq!(UserOperation::parse(&encoded, "0").unwrap(), op);
        }
    }
}
