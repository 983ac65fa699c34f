//! Positional params of each supported JSON-RPC method.
//!
//! Every element of the params tuple is validated even after an earlier one
//! failed, so a single error lists everything wrong with the call.

use std::ops::RangeInclusive;

use alloy_primitives::{Address, U256};
use serde_json::Value;

use crate::context::SponsorshipContext;
use crate::error::{PaymasterError, ValidationError};
use crate::primitives::{address, hex_number, type_name};
use crate::schema::{Issues, ObjectReader, join};
use crate::user_operation::{EntryPointVersion, eip7677, sponsor};

pub const SPONSOR_USER_OPERATION: &str = "pm_sponsorUserOperation";
pub const GET_PAYMASTER_STUB_DATA: &str = "pm_getPaymasterStubData";
pub const GET_PAYMASTER_DATA: &str = "pm_getPaymasterData";
pub const GET_TOKEN_QUOTES: &str = "pimlico_getTokenQuotes";

/// Methods this service answers.
pub const SUPPORTED_METHODS: [&str; 4] = [
    SPONSOR_USER_OPERATION,
    GET_PAYMASTER_STUB_DATA,
    GET_PAYMASTER_DATA,
    GET_TOKEN_QUOTES,
];

fn check_arity(params: &[Value], arity: RangeInclusive<usize>) -> Result<(), ValidationError> {
    if arity.contains(&params.len()) {
        return Ok(());
    }
    let expected = if arity.start() == arity.end() {
        format!("{}", arity.start())
    } else {
        format!("{} or {}", arity.start(), arity.end())
    };
    Err(ValidationError::single(
        "",
        format!("Expected {expected} params, received {}", params.len()),
    ))
}

fn element<T>(
    params: &[Value],
    index: usize,
    coerce: impl FnOnce(&Value) -> Result<T, String>,
) -> Result<T, ValidationError> {
    coerce(&params[index]).map_err(|message| ValidationError::single(index.to_string(), message))
}

/// A missing trailing context is the same as an explicit `null`.
fn context(params: &[Value], index: usize) -> Result<Option<SponsorshipContext>, ValidationError> {
    match params.get(index) {
        Some(value) => SponsorshipContext::parse(value, &index.to_string()),
        None => Ok(None),
    }
}

/// `[userOperation, entryPoint, context?]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorUserOperationParams {
    pub user_operation: sponsor::UserOperation,
    pub entry_point: Address,
    pub context: Option<SponsorshipContext>,
}

impl SponsorUserOperationParams {
    pub fn parse(params: &[Value]) -> Result<Self, ValidationError> {
        check_arity(params, 2..=3)?;
        let mut issues = Issues::default();
        let user_operation = issues.take(sponsor::UserOperation::parse(&params[0], "0"));
        let entry_point = issues.take(element(params, 1, address));
        let context = issues.take(context(params, 2));
        match (user_operation, entry_point, context) {
            (Some(user_operation), Some(entry_point), Some(context)) => Ok(Self {
                user_operation,
                entry_point,
                context,
            }),
            _ => Err(issues.into_error()),
        }
    }
}

/// `[userOperation, entryPoint, chainId, context?]`, shared by the EIP-7677
/// stub data and data calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymasterServiceParams {
    pub user_operation: eip7677::UserOperation,
    pub entry_point: Address,
    pub chain_id: U256,
    pub context: Option<SponsorshipContext>,
}

impl PaymasterServiceParams {
    pub fn parse(params: &[Value]) -> Result<Self, ValidationError> {
        check_arity(params, 3..=4)?;
        let mut issues = Issues::default();
        let user_operation = issues.take(eip7677::UserOperation::parse(&params[0], "0"));
        let entry_point = issues.take(element(params, 1, address));
        let chain_id = issues.take(element(params, 2, hex_number));
        let context = issues.take(context(params, 3));
        match (user_operation, entry_point, chain_id, context) {
            (Some(user_operation), Some(entry_point), Some(chain_id), Some(context)) => Ok(Self {
                user_operation,
                entry_point,
                chain_id,
                context,
            }),
            _ => Err(issues.into_error()),
        }
    }
}

/// `[{ tokens }, entryPoint, chainId]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuotesParams {
    pub tokens: Vec<Address>,
    pub entry_point: Address,
    pub chain_id: U256,
}

fn tokens(value: &Value, path: &str) -> Result<Vec<Address>, ValidationError> {
    let items = value.as_array().ok_or_else(|| {
        ValidationError::single(path, format!("Expected array, received {}", type_name(value)))
    })?;
    let mut issues = Issues::default();
    let tokens: Vec<_> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            issues.take(
                address(item).map_err(|message| ValidationError::single(join(path, i), message)),
            )
        })
        .collect();
    if issues.is_empty() {
        Ok(tokens)
    } else {
        Err(issues.into_error())
    }
}

impl TokenQuotesParams {
    pub fn parse(params: &[Value]) -> Result<Self, ValidationError> {
        check_arity(params, 3..=3)?;
        let mut issues = Issues::default();
        let tokens = issues.take(
            ObjectReader::open(&params[0], "0").and_then(|reader| reader.required_nested("tokens", tokens)),
        );
        let entry_point = issues.take(element(params, 1, address));
        let chain_id = issues.take(element(params, 2, hex_number));
        match (tokens, entry_point, chain_id) {
            (Some(tokens), Some(entry_point), Some(chain_id)) => Ok(Self {
                tokens,
                entry_point,
                chain_id,
            }),
            _ => Err(issues.into_error()),
        }
    }
}

/// A validated call, ready for a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymasterRequest {
    SponsorUserOperation(SponsorUserOperationParams),
    GetPaymasterStubData(PaymasterServiceParams),
    GetPaymasterData(PaymasterServiceParams),
    GetTokenQuotes(TokenQuotesParams),
}

impl PaymasterRequest {
    pub fn parse(method: &str, params: &[Value]) -> Result<Self, PaymasterError> {
        let request = match method {
            SPONSOR_USER_OPERATION => {
                Self::SponsorUserOperation(SponsorUserOperationParams::parse(params)?)
            }
            GET_PAYMASTER_STUB_DATA => {
                Self::GetPaymasterStubData(PaymasterServiceParams::parse(params)?)
            }
            GET_PAYMASTER_DATA => Self::GetPaymasterData(PaymasterServiceParams::parse(params)?),
            GET_TOKEN_QUOTES => Self::GetTokenQuotes(TokenQuotesParams::parse(params)?),
            other => return Err(PaymasterError::MethodNotFound(other.to_string())),
        };
        Ok(request)
    }

    pub const fn method(&self) -> &'static str {
        match self {
            Self::SponsorUserOperation(_) => SPONSOR_USER_OPERATION,
            Self::GetPaymasterStubData(_) => GET_PAYMASTER_STUB_DATA,
            Self::GetPaymasterData(_) => GET_PAYMASTER_DATA,
            Self::GetTokenQuotes(_) => GET_TOKEN_QUOTES,
        }
    }

    pub const fn entry_point(&self) -> Address {
        match self {
            Self::SponsorUserOperation(params) => params.entry_point,
            Self::GetPaymasterStubData(params) | Self::GetPaymasterData(params) => {
                params.entry_point
            }
            Self::GetTokenQuotes(params) => params.entry_point,
        }
    }

    /// Version the user operation resolved to, if the call carries one.
    pub const fn version(&self) -> Option<EntryPointVersion> {
        match self {
            Self::SponsorUserOperation(params) => Some(params.user_operation.version()),
            Self::GetPaymasterStubData(params) | Self::GetPaymasterData(params) => {
                Some(params.user_operation.version())
            }
            Self::GetTokenQuotes(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::primitives::HexData;
    use alloy_primitives::address;
    use serde_json::json;

    const ENTRY_POINT_V06: &str = "0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789";
    const ENTRY_POINT_V07: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";

    fn sponsor_op() -> Value {
        json!({
            "sender": "0xAbC0000000000000000000000000000000000001",
            "nonce": "0x1",
            "initCode": "0x",
            "callData": "0x",
            "maxPriorityFeePerGas": "0x1",
            "maxFeePerGas": "0x1"
        })
    }

    fn service_op() -> Value {
        json!({
            "sender": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "nonce": "0x1",
            "callData": "0x",
            "callGasLimit": "0x0",
            "verificationGasLimit": "0x0",
            "preVerificationGas": "0x0",
            "maxFeePerGas": "0x1",
            "maxPriorityFeePerGas": "0x1",
            "paymaster": null
        })
    }

    #[test]
    fn test_sponsor_call_defaults() {
        let params = [sponsor_op(), json!(ENTRY_POINT_V06)];
        let request = PaymasterRequest::parse(SPONSOR_USER_OPERATION, &params).unwrap();
        let PaymasterRequest::SponsorUserOperation(call) = request else {
            panic!("Expected sponsor call");
        };
        assert_eq!(call.entry_point, address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789"));
        assert_eq!(call.context, None);
        let sponsor::UserOperation::V06(op) = call.user_operation else {
            panic!("Expected v0.6");
        };
        assert_eq!(op.call_gas_limit, U256::from(1));
        assert_eq!(op.verification_gas_limit, U256::from(1));
        assert_eq!(op.pre_verification_gas, U256::from(1));
        assert_eq!(op.paymaster_and_data, HexData::empty());
        assert_eq!(op.signature, HexData::empty());
    }

    #[test]
    fn test_sponsor_call_explicit_null_context() {
        let params = [sponsor_op(), json!(ENTRY_POINT_V06), Value::Null];
        let call = SponsorUserOperationParams::parse(&params).unwrap();
        assert_eq!(call.context, None);
    }

    #[test]
    fn test_sponsor_call_arity() {
        let err = SponsorUserOperationParams::parse(&[sponsor_op()]).unwrap_err();
        assert_eq!(err.issues()[0].message, "Expected 2 or 3 params, received 1");
        let params = [sponsor_op(), json!(ENTRY_POINT_V06), Value::Null, Value::Null];
        assert!(SponsorUserOperationParams::parse(&params).is_err());
    }

    #[test]
    fn test_stub_data_call_keeps_unknown_as_none() {
        let params = [service_op(), json!(ENTRY_POINT_V07), json!("0x7a69")];
        let request = PaymasterRequest::parse(GET_PAYMASTER_STUB_DATA, &params).unwrap();
        assert_eq!(request.version(), Some(EntryPointVersion::V07));
        let PaymasterRequest::GetPaymasterStubData(call) = request else {
            panic!("Expected stub data call");
        };
        assert_eq!(call.chain_id, U256::from(31337));
        assert_eq!(call.context, None);
        let eip7677::UserOperation::V07(op) = call.user_operation else {
            panic!("Expected v0.7");
        };
        assert_eq!(op.paymaster_verification_gas_limit, None);
        assert_eq!(op.paymaster, None);
    }

    #[test]
    fn test_paymaster_data_call_with_context() {
        let params = [
            service_op(),
            json!(ENTRY_POINT_V07),
            json!(31337),
            json!({ "sponsorshipPolicyId": "sp_1" }),
        ];
        let request = PaymasterRequest::parse(GET_PAYMASTER_DATA, &params).unwrap();
        let PaymasterRequest::GetPaymasterData(call) = request else {
            panic!("Expected data call");
        };
        assert_eq!(
            call.context.unwrap().policy().unwrap().sponsorship_policy_id.as_deref(),
            Some("sp_1")
        );
    }

    #[test]
    fn test_malformed_address_anywhere_is_invalid_fields() {
        let mut bad_sender = sponsor_op();
        bad_sender["sender"] = json!("0x123");
        let cases: Vec<(&str, Vec<Value>)> = vec![
            (SPONSOR_USER_OPERATION, vec![bad_sender, json!(ENTRY_POINT_V06)]),
            (SPONSOR_USER_OPERATION, vec![sponsor_op(), json!("0x123")]),
            (GET_PAYMASTER_STUB_DATA, vec![service_op(), json!("0x123"), json!(1)]),
            (
                GET_PAYMASTER_DATA,
                vec![service_op(), json!(ENTRY_POINT_V07), json!(1), json!({ "token": "0x123" })],
            ),
            (GET_TOKEN_QUOTES, vec![json!({ "tokens": ["0x123"] }), json!(ENTRY_POINT_V07), json!(1)]),
        ];
        for (method, params) in cases {
            let err = PaymasterRequest::parse(method, &params).unwrap_err();
            assert_eq!(err.code(), codes::INVALID_FIELDS, "{method}");
        }
    }

    #[test]
    fn test_every_position_is_reported() {
        let params = [json!({}), json!("0x123"), json!("nope")];
        let err = PaymasterServiceParams::parse(&params).unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|issue| issue.path.as_str()).collect();
        assert!(paths.contains(&"1"));
        assert!(paths.contains(&"2"));
        assert!(paths.iter().any(|path| path.starts_with('0')));
    }

    #[test]
    fn test_token_quotes() {
        let params = [
            json!({ "tokens": ["0xfffffffffffffffffffffffffffffffffffffffe"] }),
            json!(ENTRY_POINT_V07),
            json!("0x1"),
        ];
        let request = PaymasterRequest::parse(GET_TOKEN_QUOTES, &params).unwrap();
        assert_eq!(request.version(), None);
        let PaymasterRequest::GetTokenQuotes(call) = request else {
            panic!("Expected token quotes call");
        };
        assert_eq!(call.tokens, vec![address!("fffffffffffffffffffffffffffffffffffffffe")]);
        assert_eq!(call.chain_id, U256::from(1));
    }

    #[test]
    fn test_token_quotes_paths() {
        let params = [
            json!({ "tokens": ["0xfffffffffffffffffffffffffffffffffffffffe", "0x1"] }),
            json!(ENTRY_POINT_V07),
            json!("0x1"),
        ];
        let err = TokenQuotesParams::parse(&params).unwrap_err();
        assert_eq!(err.issues()[0].path, "0.tokens.1");
    }

    #[test]
    fn test_unknown_method() {
        let err = PaymasterRequest::parse("eth_chainId", &[]).unwrap_err();
        assert_eq!(err, PaymasterError::MethodNotFound("eth_chainId".to_string()));
    }
}
