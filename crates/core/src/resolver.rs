//! Picks the user operation version from field presence alone.
//!
//! The wire format carries no version tag, so each family lists its version
//! schemas in a fixed order and the first closed-schema match wins. When
//! nothing matches, the issues of every attempt are reported together, each
//! labelled with the version that produced it.

use serde_json::Value;

use crate::error::ValidationError;
use crate::schema::Issues;
use crate::user_operation::EntryPointVersion;

/// One version schema of a family.
#[derive(Debug)]
pub struct Candidate<T> {
    pub version: EntryPointVersion,
    pub parse: fn(&Value, &str) -> Result<T, ValidationError>,
}

/// A family of version schemas tried in declared order.
pub trait OperationFamily {
    type Operation: 'static;

    /// Earlier entries win ties.
    const CANDIDATES: &'static [Candidate<Self::Operation>];
}

/// Validates `value` against the first matching schema of `F`.
pub fn resolve<F: OperationFamily>(value: &Value, path: &str) -> Result<F::Operation, ValidationError> {
    let mut issues = Issues::default();
    for candidate in F::CANDIDATES {
        match (candidate.parse)(value, path) {
            Ok(operation) => return Ok(operation),
            Err(err) => issues.push(err.labelled(candidate.version.as_str())),
        }
    }
    Err(issues.into_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Numbers;

    fn small(value: &Value, path: &str) -> Result<u64, ValidationError> {
        match value.as_u64() {
            Some(n) if n < 10 => Ok(n),
            _ => Err(ValidationError::single(path, "not small")),
        }
    }

    fn any(value: &Value, path: &str) -> Result<u64, ValidationError> {
        value
            .as_u64()
            .map(|n| n + 100)
            .ok_or_else(|| ValidationError::single(path, "not a number"))
    }

    impl OperationFamily for Numbers {
        type Operation = u64;
        const CANDIDATES: &'static [Candidate<u64>] = &[
            Candidate { version: EntryPointVersion::V06, parse: small },
            Candidate { version: EntryPointVersion::V07, parse: any },
        ];
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(resolve::<Numbers>(&json!(3), "0").unwrap(), 3);
        assert_eq!(resolve::<Numbers>(&json!(30), "0").unwrap(), 130);
    }

    #[test]
    fn test_reports_every_attempt() {
        let err = resolve::<Numbers>(&json!("x"), "0").unwrap_err();
        let messages: Vec<_> = err.issues().iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["[v0.6] not small", "[v0.7] not a number"]);
    }
}
