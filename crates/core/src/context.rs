//! Caller supplied sponsorship context.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::primitives::{address, type_name};
use crate::schema::ObjectReader;

/// How the caller wants the paymaster fee covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SponsorshipContext {
    /// Pay the paymaster in an ERC-20 token.
    Token { token: Address },
    /// Sponsor under a policy.
    Policy(SponsorshipPolicy),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsorship_policy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_for_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,
}

impl SponsorshipContext {
    /// `null` means no context. An object with a `token` key is always read as a
    /// token context; anything else is a policy whose unknown keys are ignored.
    pub fn parse(value: &Value, path: &str) -> Result<Option<Self>, ValidationError> {
        if value.is_null() {
            return Ok(None);
        }
        let reader = ObjectReader::open(value, path)?;
        if reader.contains("token") {
            let token = reader.required("token", address)?;
            return Ok(Some(Self::Token { token }));
        }
        Ok(Some(Self::Policy(SponsorshipPolicy {
            sponsorship_policy_id: reader.optional("sponsorshipPolicyId", string)?,
            valid_for_seconds: reader.optional("validForSeconds", seconds)?,
            meta: reader.optional("meta", meta)?,
        })))
    }

    pub const fn token(&self) -> Option<Address> {
        match self {
            Self::Token { token } => Some(*token),
            Self::Policy(_) => None,
        }
    }

    pub fn policy(&self) -> Option<&SponsorshipPolicy> {
        match self {
            Self::Token { .. } => None,
            Self::Policy(policy) => Some(policy),
        }
    }
}

fn string(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("Expected string, received {}", type_name(value)))
}

fn seconds(value: &Value) -> Result<u64, String> {
    value
        .as_u64()
        .ok_or_else(|| format!("Expected non-negative integer, received {value}"))
}

fn meta(value: &Value) -> Result<BTreeMap<String, String>, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("Expected object, received {}", type_name(value)))?;
    object
        .iter()
        .map(|(key, value)| string(value).map(|value| (key.clone(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    #[test]
    fn test_null_is_absent() {
        assert_eq!(SponsorshipContext::parse(&Value::Null, "2").unwrap(), None);
    }

    #[test]
    fn test_token_context() {
        let context = SponsorshipContext::parse(
            &json!({ "token": "0xfffffffffffffffffffffffffffffffffffffffe" }),
            "2",
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            context.token(),
            Some(address!("fffffffffffffffffffffffffffffffffffffffe"))
        );
    }

    #[test]
    fn test_malformed_token_is_not_a_policy() {
        let err = SponsorshipContext::parse(&json!({ "token": "0x123" }), "2").unwrap_err();
        assert_eq!(err.issues()[0].path, "2.token");
    }

    #[test]
    fn test_policy_context() {
        let context = SponsorshipContext::parse(
            &json!({
                "sponsorshipPolicyId": "sp_test",
                "validForSeconds": 60,
                "meta": { "dapp": "demo" },
                "ignored": true
            }),
            "2",
        )
        .unwrap()
        .unwrap();
        let policy = context.policy().unwrap();
        assert_eq!(policy.sponsorship_policy_id.as_deref(), Some("sp_test"));
        assert_eq!(policy.valid_for_seconds, Some(60));
        assert_eq!(policy.meta.as_ref().unwrap()["dapp"], "demo");
    }

    #[test]
    fn test_empty_object_is_empty_policy() {
        let context = SponsorshipContext::parse(&json!({}), "2").unwrap().unwrap();
        assert_eq!(context, SponsorshipContext::Policy(SponsorshipPolicy::default()));
    }

    #[test]
    fn test_policy_field_types() {
        assert!(SponsorshipContext::parse(&json!({ "sponsorshipPolicyId": 1 }), "2").is_err());
        assert!(SponsorshipContext::parse(&json!({ "meta": { "a": 1 } }), "2").is_err());
        assert!(SponsorshipContext::parse(&json!("policy"), "2").is_err());
    }
}
