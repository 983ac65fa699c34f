//! A [`PaymasterHandler`] that sponsors everything it is asked to.
//!
//! Paymaster data is `validUntil ‖ validAfter ‖ signature` with 6-byte
//! timestamps. No key is held, so the 65-byte signature is left zeroed.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use mock_paymaster_core::user_operation::sponsor::NOT_ESTIMATED;
use mock_paymaster_core::user_operation::{eip7677, sponsor};
use mock_paymaster_core::{
    EntryPointVersion, HexData, PaymasterError, PaymasterServiceParams, SponsorUserOperationParams,
    SponsorshipContext, TokenQuotesParams,
};
use tracing::{debug, warn};

use crate::Config;
use crate::handler::PaymasterHandler;
use crate::types::{
    PaymasterDataResult, SponsorInfo, SponsorResult, StubDataResult, TokenQuote, TokenQuotesResult,
};

const SIGNATURE_LEN: usize = 65;
const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

/// One token per native unit, 18 decimals.
const EXCHANGE_RATE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
/// 3000 USD per native unit, 6 decimals.
const EXCHANGE_RATE_NATIVE_TO_USD: U256 = U256::from_limbs([3_000_000_000, 0, 0, 0]);
const BALANCE_SLOT: U256 = U256::ZERO;
const ALLOWANCE_SLOT: U256 = U256::from_limbs([1, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deployment {
    version: EntryPointVersion,
    entry_point: Address,
    paymaster: Address,
}

/// Gas values of a user operation.
#[derive(Debug, Clone, Copy)]
struct Gas {
    call_gas_limit: U256,
    verification_gas_limit: U256,
    pre_verification_gas: U256,
}

#[derive(Debug, Clone)]
pub struct StubPaymaster {
    chain_id: u64,
    deployments: [Deployment; 3],
    paymaster_verification_gas_limit: U256,
    paymaster_post_op_gas_limit: U256,
    estimates: Gas,
    valid_for_seconds: u64,
    sponsor_name: String,
}

impl StubPaymaster {
    pub fn new(config: &Config, chain_id: u64) -> Self {
        Self {
            chain_id,
            deployments: [
                Deployment {
                    version: EntryPointVersion::V06,
                    entry_point: config.entry_point_v06,
                    paymaster: config.paymaster_v06,
                },
                Deployment {
                    version: EntryPointVersion::V07,
                    entry_point: config.entry_point_v07,
                    paymaster: config.paymaster_v07,
                },
                Deployment {
                    version: EntryPointVersion::V08,
                    entry_point: config.entry_point_v08,
                    paymaster: config.paymaster_v08,
                },
            ],
            paymaster_verification_gas_limit: U256::from(config.paymaster_verification_gas_limit),
            paymaster_post_op_gas_limit: U256::from(config.paymaster_post_op_gas_limit),
            estimates: Gas {
                call_gas_limit: U256::from(config.call_gas_limit),
                verification_gas_limit: U256::from(config.verification_gas_limit),
                pre_verification_gas: U256::from(config.pre_verification_gas),
            },
            valid_for_seconds: config.valid_for_seconds,
            sponsor_name: config.sponsor_name.clone(),
        }
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn deployment(&self, entry_point: Address) -> Result<&Deployment, PaymasterError> {
        self.deployments
            .iter()
            .find(|deployment| deployment.entry_point == entry_point)
            .ok_or_else(|| {
                PaymasterError::UnsupportedEntryPoint(format!(
                    "EntryPoint {entry_point} is not supported"
                ))
            })
    }

    /// v0.7 and v0.8 operations share a layout, so either of their entry
    /// points serves both. v0.6 operations need the v0.6 entry point.
    fn deployment_for(
        &self,
        entry_point: Address,
        version: EntryPointVersion,
    ) -> Result<&Deployment, PaymasterError> {
        let deployment = self.deployment(entry_point)?;
        let packed = |version| version == EntryPointVersion::V06;
        if packed(deployment.version) != packed(version) {
            return Err(PaymasterError::UnsupportedEntryPoint(format!(
                "EntryPoint {entry_point} does not accept {version} user operations"
            )));
        }
        Ok(deployment)
    }

    fn check_chain_id(&self, chain_id: U256) {
        if chain_id != U256::from(self.chain_id) {
            warn!(
                message = "Chain id does not match the served chain",
                requested = %chain_id,
                served = self.chain_id,
            );
        }
    }

    fn sponsor_info(&self) -> SponsorInfo {
        SponsorInfo {
            name: self.sponsor_name.clone(),
        }
    }

    fn valid_for_seconds(&self, context: Option<&SponsorshipContext>) -> u64 {
        context
            .and_then(SponsorshipContext::policy)
            .and_then(|policy| policy.valid_for_seconds)
            .unwrap_or(self.valid_for_seconds)
    }

    /// `validUntil ‖ validAfter ‖ signature`, valid from now on.
    fn paymaster_data(&self, context: Option<&SponsorshipContext>) -> Vec<u8> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let valid_until = now
            .saturating_add(self.valid_for_seconds(context))
            .min(MAX_TIMESTAMP);
        let valid_after = 0u64;

        let mut data = Vec::with_capacity(12 + SIGNATURE_LEN);
        data.extend_from_slice(&valid_until.to_be_bytes()[2..]);
        data.extend_from_slice(&valid_after.to_be_bytes()[2..]);
        data.extend_from_slice(&[0u8; SIGNATURE_LEN]);
        data
    }

    fn split_data(&self, context: Option<&SponsorshipContext>) -> HexData {
        HexData::from(Bytes::from(self.paymaster_data(context)))
    }

    fn packed_data(&self, paymaster: Address, context: Option<&SponsorshipContext>) -> HexData {
        let mut data = paymaster.to_vec();
        data.extend(self.paymaster_data(context));
        HexData::from(Bytes::from(data))
    }

    /// Replaces gas values the caller left at the placeholder.
    fn estimate(&self, gas: Gas) -> Gas {
        let pick = |value: U256, estimate: U256| {
            if value == NOT_ESTIMATED { estimate } else { value }
        };
        Gas {
            call_gas_limit: pick(gas.call_gas_limit, self.estimates.call_gas_limit),
            verification_gas_limit: pick(
                gas.verification_gas_limit,
                self.estimates.verification_gas_limit,
            ),
            pre_verification_gas: pick(gas.pre_verification_gas, self.estimates.pre_verification_gas),
        }
    }

    fn split_sponsor_result(
        &self,
        deployment: &Deployment,
        context: Option<&SponsorshipContext>,
        gas: Gas,
    ) -> SponsorResult {
        let gas = self.estimate(gas);
        SponsorResult::Split {
            paymaster: deployment.paymaster,
            paymaster_data: self.split_data(context),
            paymaster_verification_gas_limit: self.paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit: self.paymaster_post_op_gas_limit,
            pre_verification_gas: gas.pre_verification_gas,
            verification_gas_limit: gas.verification_gas_limit,
            call_gas_limit: gas.call_gas_limit,
        }
    }

    fn split_stub_result(
        &self,
        deployment: &Deployment,
        context: Option<&SponsorshipContext>,
        verification_gas_limit: Option<U256>,
        post_op_gas_limit: Option<U256>,
    ) -> StubDataResult {
        StubDataResult::Split {
            paymaster: deployment.paymaster,
            paymaster_data: self.split_data(context),
            paymaster_verification_gas_limit: verification_gas_limit
                .unwrap_or(self.paymaster_verification_gas_limit),
            paymaster_post_op_gas_limit: post_op_gas_limit
                .unwrap_or(self.paymaster_post_op_gas_limit),
            sponsor: self.sponsor_info(),
            is_final: false,
        }
    }
}

#[async_trait]
impl PaymasterHandler for StubPaymaster {
    async fn sponsor_user_operation(
        &self,
        params: SponsorUserOperationParams,
    ) -> Result<SponsorResult, PaymasterError> {
        let operation = &params.user_operation;
        let deployment = self.deployment_for(params.entry_point, operation.version())?;
        let context = params.context.as_ref();

        debug!(
            message = "Sponsoring user operation",
            sender = %operation.sender(),
            nonce = %operation.nonce(),
            version = %operation.version(),
        );

        let result = match operation {
            sponsor::UserOperation::V06(op) => {
                let gas = self.estimate(Gas {
                    call_gas_limit: op.call_gas_limit,
                    verification_gas_limit: op.verification_gas_limit,
                    pre_verification_gas: op.pre_verification_gas,
                });
                SponsorResult::Packed {
                    paymaster_and_data: self.packed_data(deployment.paymaster, context),
                    pre_verification_gas: gas.pre_verification_gas,
                    verification_gas_limit: gas.verification_gas_limit,
                    call_gas_limit: gas.call_gas_limit,
                }
            }
            sponsor::UserOperation::V07(op) => self.split_sponsor_result(
                deployment,
                context,
                Gas {
                    call_gas_limit: op.call_gas_limit,
                    verification_gas_limit: op.verification_gas_limit,
                    pre_verification_gas: op.pre_verification_gas,
                },
            ),
            sponsor::UserOperation::V08(op) => self.split_sponsor_result(
                deployment,
                context,
                Gas {
                    call_gas_limit: op.call_gas_limit,
                    verification_gas_limit: op.verification_gas_limit,
                    pre_verification_gas: op.pre_verification_gas,
                },
            ),
        };
        Ok(result)
    }

    async fn get_paymaster_stub_data(
        &self,
        params: PaymasterServiceParams,
    ) -> Result<StubDataResult, PaymasterError> {
        self.check_chain_id(params.chain_id);
        let deployment = self.deployment_for(params.entry_point, params.user_operation.version())?;
        let context = params.context.as_ref();

        let result = match &params.user_operation {
            eip7677::UserOperation::V06(_) => StubDataResult::Packed {
                paymaster_and_data: self.packed_data(deployment.paymaster, context),
                sponsor: self.sponsor_info(),
                is_final: false,
            },
            eip7677::UserOperation::V07(op) => self.split_stub_result(
                deployment,
                context,
                op.paymaster_verification_gas_limit,
                op.paymaster_post_op_gas_limit,
            ),
            eip7677::UserOperation::V08(op) => self.split_stub_result(
                deployment,
                context,
                op.paymaster_verification_gas_limit,
                op.paymaster_post_op_gas_limit,
            ),
        };
        Ok(result)
    }

    async fn get_paymaster_data(
        &self,
        params: PaymasterServiceParams,
    ) -> Result<PaymasterDataResult, PaymasterError> {
        self.check_chain_id(params.chain_id);
        let deployment = self.deployment_for(params.entry_point, params.user_operation.version())?;
        let context = params.context.as_ref();

        let result = match deployment.version {
            EntryPointVersion::V06 => PaymasterDataResult::Packed {
                paymaster_and_data: self.packed_data(deployment.paymaster, context),
            },
            EntryPointVersion::V07 | EntryPointVersion::V08 => PaymasterDataResult::Split {
                paymaster: deployment.paymaster,
                paymaster_data: self.split_data(context),
            },
        };
        Ok(result)
    }

    async fn get_token_quotes(
        &self,
        params: TokenQuotesParams,
    ) -> Result<TokenQuotesResult, PaymasterError> {
        self.check_chain_id(params.chain_id);
        let deployment = self.deployment(params.entry_point)?;

        let quotes = params
            .tokens
            .into_iter()
            .map(|token| TokenQuote {
                paymaster: deployment.paymaster,
                token,
                post_op_gas: self.paymaster_post_op_gas_limit,
                exchange_rate: EXCHANGE_RATE,
                exchange_rate_native_to_usd: EXCHANGE_RATE_NATIVE_TO_USD,
                balance_slot: BALANCE_SLOT,
                allowance_slot: ALLOWANCE_SLOT,
            })
            .collect();
        Ok(TokenQuotesResult { quotes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mock_paymaster_core::PaymasterRequest;
    use mock_paymaster_core::error::codes;
    use mock_paymaster_core::params::{GET_PAYMASTER_STUB_DATA, SPONSOR_USER_OPERATION};
    use serde_json::{Value, json};

    const ENTRY_POINT_V06: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    const ENTRY_POINT_V07: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";
    const ENTRY_POINT_V08: &str = "0x4337084D9E255Ff0702461CF8895CE9E3b5Ff108";

    fn paymaster() -> StubPaymaster {
        StubPaymaster::new(&Config::parse_from(["mock-paymaster"]), 31337)
    }

    fn v06_op() -> Value {
        json!({
            "sender": "0x1111111111111111111111111111111111111111",
            "nonce": "0x1",
            "initCode": "0x",
            "callData": "0x",
            "callGasLimit": "0x5208",
            "maxPriorityFeePerGas": "0x1",
            "maxFeePerGas": "0x1"
        })
    }

    fn v07_op() -> Value {
        json!({
            "sender": "0x1111111111111111111111111111111111111111",
            "nonce": "0x1",
            "callData": "0x",
            "maxPriorityFeePerGas": "0x1",
            "maxFeePerGas": "0x1",
            "paymasterPostOpGasLimit": "0x10"
        })
    }

    fn v07_service_op() -> Value {
        let mut op = v07_op();
        op["callGasLimit"] = json!("0x0");
        op["verificationGasLimit"] = json!("0x0");
        op["preVerificationGas"] = json!("0x0");
        op
    }

    fn sponsor_params(params: Value) -> SponsorUserOperationParams {
        let params = params.as_array().cloned().unwrap();
        match PaymasterRequest::parse(SPONSOR_USER_OPERATION, &params).unwrap() {
            PaymasterRequest::SponsorUserOperation(params) => params,
            other => panic!("unexpected request {other:?}"),
        }
    }

    fn service_params(params: Value) -> PaymasterServiceParams {
        let params = params.as_array().cloned().unwrap();
        match PaymasterRequest::parse(GET_PAYMASTER_STUB_DATA, &params).unwrap() {
            PaymasterRequest::GetPaymasterStubData(params) => params,
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sponsor_v06_fills_estimates() {
        let params = sponsor_params(json!([v06_op(), ENTRY_POINT_V06]));
        let result = paymaster().sponsor_user_operation(params).await.unwrap();
        let SponsorResult::Packed {
            paymaster_and_data,
            pre_verification_gas,
            verification_gas_limit,
            call_gas_limit,
        } = result
        else {
            panic!("expected packed result");
        };
        assert_eq!(call_gas_limit, U256::from(0x5208));
        assert_eq!(verification_gas_limit, U256::from(300_000));
        assert_eq!(pre_verification_gas, U256::from(60_000));
        // paymaster, validUntil, validAfter, signature
        assert_eq!(paymaster_and_data.to_bytes().unwrap().len(), 20 + 6 + 6 + 65);
        assert!(
            paymaster_and_data
                .as_str()
                .starts_with("0x0000000000000000000000000000000000ba0006")
        );
    }

    #[tokio::test]
    async fn test_sponsor_v07_split_result() {
        let params = sponsor_params(json!([v07_op(), ENTRY_POINT_V07]));
        let result = paymaster().sponsor_user_operation(params).await.unwrap();
        let SponsorResult::Split {
            paymaster_data,
            paymaster_verification_gas_limit,
            call_gas_limit,
            ..
        } = result
        else {
            panic!("expected split result");
        };
        assert_eq!(paymaster_data.to_bytes().unwrap().len(), 6 + 6 + 65);
        assert_eq!(paymaster_verification_gas_limit, U256::from(50_000));
        assert_eq!(call_gas_limit, U256::from(100_000));
    }

    #[tokio::test]
    async fn test_unsupported_entry_point() {
        let params = sponsor_params(json!([
            v06_op(),
            "0x1111111111111111111111111111111111111111"
        ]));
        let err = paymaster().sponsor_user_operation(params).await.unwrap_err();
        assert_eq!(err.code(), codes::UNSUPPORTED_ENTRY_POINT);
    }

    #[tokio::test]
    async fn test_layout_must_match_entry_point() {
        let params = sponsor_params(json!([v06_op(), ENTRY_POINT_V07]));
        let err = paymaster().sponsor_user_operation(params).await.unwrap_err();
        assert_eq!(err.code(), codes::UNSUPPORTED_ENTRY_POINT);

        let params = sponsor_params(json!([v07_op(), ENTRY_POINT_V08]));
        assert!(paymaster().sponsor_user_operation(params).await.is_ok());
    }

    #[tokio::test]
    async fn test_stub_data_keeps_supplied_gas() {
        let params = service_params(json!([v07_service_op(), ENTRY_POINT_V07, "0x7a69"]));
        let result = paymaster().get_paymaster_stub_data(params).await.unwrap();
        let StubDataResult::Split {
            paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit,
            is_final,
            ..
        } = result
        else {
            panic!("expected split result");
        };
        assert_eq!(paymaster_verification_gas_limit, U256::from(50_000));
        assert_eq!(paymaster_post_op_gas_limit, U256::from(0x10));
        assert!(!is_final);
    }

    #[tokio::test]
    async fn test_paymaster_data_uses_policy_validity() {
        let params = service_params(json!([
            v07_service_op(),
            ENTRY_POINT_V07,
            "0x7a69",
            { "validForSeconds": 0 }
        ]));
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let result = paymaster().get_paymaster_data(params).await.unwrap();
        let PaymasterDataResult::Split { paymaster_data, .. } = result else {
            panic!("expected split result");
        };
        let bytes = paymaster_data.to_bytes().unwrap();
        let mut valid_until = [0u8; 8];
        valid_until[2..].copy_from_slice(&bytes[..6]);
        let valid_until = u64::from_be_bytes(valid_until);
        assert!(valid_until >= now && valid_until <= now + 5);
    }

    #[tokio::test]
    async fn test_token_quotes() {
        let params = TokenQuotesParams {
            tokens: vec![Address::repeat_byte(0x22), Address::repeat_byte(0x33)],
            entry_point: ENTRY_POINT_V07.parse().unwrap(),
            chain_id: U256::from(31337),
        };
        let result = paymaster().get_token_quotes(params).await.unwrap();
        assert_eq!(result.quotes.len(), 2);
        assert_eq!(result.quotes[1].token, Address::repeat_byte(0x33));
        assert_eq!(result.quotes[0].exchange_rate, EXCHANGE_RATE);
    }
}
