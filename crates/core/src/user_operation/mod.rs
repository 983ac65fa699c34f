//! ERC-4337 user operations in their three wire versions.
//!
//! Two schema families exist per version. [`sponsor`] backs
//! `pm_sponsorUserOperation`, where gas fields that were not estimated yet are
//! filled with a placeholder of `1`. [`eip7677`] backs the EIP-7677 paymaster
//! service calls, where unknown optional fields stay `None` so the handler can
//! tell a supplied value from a missing one.

pub mod eip7677;
pub mod sponsor;

use std::fmt;

use alloy_primitives::Address;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::primitives::address;

/// Factory literal meaning the sender delegates to itself through EIP-7702.
pub const EIP7702_FACTORY: &str = "0x7702";

pub(crate) const V06_KEYS: [&str; 12] = [
    "sender",
    "nonce",
    "initCode",
    "callData",
    "callGasLimit",
    "verificationGasLimit",
    "preVerificationGas",
    "maxPriorityFeePerGas",
    "maxFeePerGas",
    "paymasterAndData",
    "signature",
    "eip7702Auth",
];

pub(crate) const V07_KEYS: [&str; 16] = [
    "sender",
    "nonce",
    "factory",
    "factoryData",
    "callData",
    "callGasLimit",
    "verificationGasLimit",
    "preVerificationGas",
    "maxFeePerGas",
    "maxPriorityFeePerGas",
    "paymaster",
    "paymasterVerificationGasLimit",
    "paymasterPostOpGasLimit",
    "paymasterData",
    "signature",
    "eip7702Auth",
];

/// Entry point version a user operation was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPointVersion {
    V06,
    V07,
    V08,
}

impl EntryPointVersion {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V06 => "v0.6",
            Self::V07 => "v0.7",
            Self::V08 => "v0.8",
        }
    }
}

impl fmt::Display for EntryPointVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `factory` field of a v0.8 operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factory {
    Contract(Address),
    /// The sender authorizes itself inline through `eip7702Auth`.
    Eip7702,
}

impl Factory {
    pub const fn address(&self) -> Option<Address> {
        match self {
            Self::Contract(address) => Some(*address),
            Self::Eip7702 => None,
        }
    }
}

impl Serialize for Factory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Contract(address) => address.serialize(serializer),
            Self::Eip7702 => serializer.serialize_str(EIP7702_FACTORY),
        }
    }
}

pub(crate) fn factory(value: &Value) -> Result<Factory, String> {
    if value.as_str() == Some(EIP7702_FACTORY) {
        return Ok(Factory::Eip7702);
    }
    address(value)
        .map(Factory::Contract)
        .map_err(|message| format!("{message} or '{EIP7702_FACTORY}'"))
}
