//! Results returned by the paymaster methods.
//!
//! v0.6 operations carry paymaster fields packed into `paymasterAndData`,
//! later versions carry them split. Each result is therefore an untagged
//! union over the two layouts.

use alloy_primitives::{Address, U256};
use mock_paymaster_core::HexData;
use serde::Serialize;

/// Result of `pm_sponsorUserOperation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SponsorResult {
    #[serde(rename_all = "camelCase")]
    Packed {
        paymaster_and_data: HexData,
        pre_verification_gas: U256,
        verification_gas_limit: U256,
        call_gas_limit: U256,
    },
    #[serde(rename_all = "camelCase")]
    Split {
        paymaster: Address,
        paymaster_data: HexData,
        paymaster_verification_gas_limit: U256,
        paymaster_post_op_gas_limit: U256,
        pre_verification_gas: U256,
        verification_gas_limit: U256,
        call_gas_limit: U256,
    },
}

/// Display information about who pays for the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorInfo {
    pub name: String,
}

/// Result of `pm_getPaymasterStubData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StubDataResult {
    #[serde(rename_all = "camelCase")]
    Packed {
        paymaster_and_data: HexData,
        sponsor: SponsorInfo,
        is_final: bool,
    },
    #[serde(rename_all = "camelCase")]
    Split {
        paymaster: Address,
        paymaster_data: HexData,
        paymaster_verification_gas_limit: U256,
        paymaster_post_op_gas_limit: U256,
        sponsor: SponsorInfo,
        is_final: bool,
    },
}

/// Result of `pm_getPaymasterData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PaymasterDataResult {
    #[serde(rename_all = "camelCase")]
    Packed { paymaster_and_data: HexData },
    #[serde(rename_all = "camelCase")]
    Split {
        paymaster: Address,
        paymaster_data: HexData,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuote {
    pub paymaster: Address,
    pub token: Address,
    pub post_op_gas: U256,
    pub exchange_rate: U256,
    pub exchange_rate_native_to_usd: U256,
    pub balance_slot: U256,
    pub allowance_slot: U256,
}

/// Result of `pimlico_getTokenQuotes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenQuotesResult {
    pub quotes: Vec<TokenQuote>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    #[test]
    fn test_packed_layout() {
        let result = PaymasterDataResult::Packed {
            paymaster_and_data: HexData::empty(),
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({ "paymasterAndData": "0x" })
        );
    }

    #[test]
    fn test_split_layout() {
        let result = StubDataResult::Split {
            paymaster: address!("1111111111111111111111111111111111111111"),
            paymaster_data: HexData::empty(),
            paymaster_verification_gas_limit: U256::from(50_000),
            paymaster_post_op_gas_limit: U256::from(20_000),
            sponsor: SponsorInfo {
                name: "Mock Paymaster".to_string(),
            },
            is_final: false,
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({
                "paymaster": "0x1111111111111111111111111111111111111111",
                "paymasterData": "0x",
                "paymasterVerificationGasLimit": "0xc350",
                "paymasterPostOpGasLimit": "0x4e20",
                "sponsor": { "name": "Mock Paymaster" },
                "isFinal": false
            })
        );
    }
}
