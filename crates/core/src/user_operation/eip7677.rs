//! User operations as sent to the EIP-7677 paymaster service calls
//! (`pm_getPaymasterStubData`, `pm_getPaymasterData`).
//!
//! These calls happen before the operation is signed. Optional fields that
//! are absent or `null` stay `None`, and v0.8 operations may carry an
//! authorization that is not signed yet.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use serde_json::Value;

use super::{EntryPointVersion, Factory, V06_KEYS, V07_KEYS, factory};
use crate::authorization::{
    PartialAuthorization, SignedAuthorization, partial_authorization, signed_authorization,
};
use crate::error::ValidationError;
use crate::primitives::{HexData, address, hex_data, hex_number};
use crate::resolver::{Candidate, OperationFamily, resolve};
use crate::schema::ObjectReader;

/// `paymasterAndData` and `signature` are accepted but always reset to `0x`:
/// the service is the one producing them.
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
    pub eip7702_auth: Option<SignedAuthorization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV07 {
    pub sender: Address,
    pub nonce: U256,
    pub factory: Option<Address>,
    pub factory_data: Option<HexData>,
    pub call_data: HexData,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster: Option<Address>,
    pub paymaster_verification_gas_limit: Option<U256>,
    pub paymaster_post_op_gas_limit: Option<U256>,
    pub paymaster_data: Option<HexData>,
    pub signature: HexData,
    pub eip7702_auth: Option<SignedAuthorization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV08 {
    pub sender: Address,
    pub nonce: U256,
    pub factory: Option<Factory>,
    pub factory_data: Option<HexData>,
    pub call_data: HexData,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster: Option<Address>,
    pub paymaster_verification_gas_limit: Option<U256>,
    pub paymaster_post_op_gas_limit: Option<U256>,
    pub paymaster_data: Option<HexData>,
    pub signature: HexData,
    pub eip7702_auth: Option<PartialAuthorization>,
}

/// A paymaster service call's user operation, tagged with the version it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserOperation {
    V06(UserOperationV06),
    V07(UserOperationV07),
    V08(UserOperationV08),
}

impl UserOperation {
    pub fn parse(value: &Value, path: &str) -> Result<Self, ValidationError> {
        resolve::<Eip7677>(value, path)
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

fn parse_v06(value: &Value, path: &str) -> Result<UserOperation, ValidationError> {
    let reader = ObjectReader::closed(value, path, &V06_KEYS)?;
    let op = UserOperationV06 {
        sender: reader.required("sender", address)?,
        nonce: reader.required("nonce", hex_number)?,
        init_code: reader.required("initCode", hex_data)?,
        call_data: reader.required("callData", hex_data)?,
        call_gas_limit: reader.required("callGasLimit", hex_number)?,
        verification_gas_limit: reader.required("verificationGasLimit", hex_number)?,
        pre_verification_gas: reader.required("preVerificationGas", hex_number)?,
        max_priority_fee_per_gas: reader.required("maxPriorityFeePerGas", hex_number)?,
        max_fee_per_gas: reader.required("maxFeePerGas", hex_number)?,
        paymaster_and_data: reader
            .nullable("paymasterAndData", hex_data)
            .map(|_| HexData::empty())?,
        signature: reader.nullable("signature", hex_data).map(|_| HexData::empty())?,
        eip7702_auth: reader.nullable_nested("eip7702Auth", signed_authorization)?,
    };
    Ok(UserOperation::V06(op))
}

fn parse_v07(value: &Value, path: &str) -> Result<UserOperation, ValidationError> {
    let reader = ObjectReader::closed(value, path, &V07_KEYS)?;
    let op = UserOperationV07 {
        sender: reader.required("sender", address)?,
        nonce: reader.required("nonce", hex_number)?,
        factory: reader.nullable("factory", address)?,
        factory_data: reader.nullable("factoryData", hex_data)?,
        call_data: reader.required("callData", hex_data)?,
        call_gas_limit: reader.required("callGasLimit", hex_number)?,
        verification_gas_limit: reader.required("verificationGasLimit", hex_number)?,
        pre_verification_gas: reader.required("preVerificationGas", hex_number)?,
        max_fee_per_gas: reader.required("maxFeePerGas", hex_number)?,
        max_priority_fee_per_gas: reader.required("maxPriorityFeePerGas", hex_number)?,
        paymaster: reader.nullable("paymaster", address)?,
        paymaster_verification_gas_limit: reader.nullable("paymasterVerificationGasLimit", hex_number)?,
        paymaster_post_op_gas_limit: reader.nullable("paymasterPostOpGasLimit", hex_number)?,
        paymaster_data: reader.nullable("paymasterData", hex_data)?,
        signature: reader.or_placeholder("signature", hex_data, HexData::empty())?,
        eip7702_auth: reader.nullable_nested("eip7702Auth", signed_authorization)?,
    };
    Ok(UserOperation::V07(op))
}

fn parse_v08(value: &Value, path: &str) -> Result<UserOperation, ValidationError> {
    let reader = ObjectReader::closed(value, path, &V07_KEYS)?;
    let op = UserOperationV08 {
        sender: reader.required("sender", address)?,
        nonce: reader.required("nonce", hex_number)?,
        factory: reader.nullable("factory", factory)?,
        factory_data: reader.nullable("factoryData", hex_data)?,
        call_data: reader.required("callData", hex_data)?,
        call_gas_limit: reader.required("callGasLimit", hex_number)?,
        verification_gas_limit: reader.required("verificationGasLimit", hex_number)?,
        pre_verification_gas: reader.required("preVerificationGas", hex_number)?,
        max_fee_per_gas: reader.required("maxFeePerGas", hex_number)?,
        max_priority_fee_per_gas: reader.required("maxPriorityFeePerGas", hex_number)?,
        paymaster: reader.nullable("paymaster", address)?,
        paymaster_verification_gas_limit: reader.nullable("paymasterVerificationGasLimit", hex_number)?,
        paymaster_post_op_gas_limit: reader.nullable("paymasterPostOpGasLimit", hex_number)?,
        paymaster_data: reader.nullable("paymasterData", hex_data)?,
        signature: reader.or_placeholder("signature", hex_data, HexData::empty())?,
        eip7702_auth: reader.nullable_nested("eip7702Auth", partial_authorization)?,
    };
    Ok(UserOperation::V08(op))
}

/// Schema family of the EIP-7677 paymaster service calls.
#[derive(Debug, Clone, Copy)]
pub struct Eip7677;

impl OperationFamily for Eip7677 {
    type Operation = UserOperation;

    const CANDIDATES: &'static [Candidate<UserOperation>] = &[
        Candidate { version: EntryPointVersion::V06, parse: parse_v06 },
        Candidate { version: EntryPointVersion::V07, parse: parse_v07 },
        Candidate { version: EntryPointVersion::V08, parse: parse_v08 },
    ];
}
