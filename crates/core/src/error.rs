//! Error taxonomy for paymaster calls.

use std::fmt;

use serde::Serialize;

/// JSON-RPC error codes returned by the paymaster.
pub mod codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Any field failed validation.
    pub const INVALID_FIELDS: i32 = -32602;
    /// The paymaster cannot cover the operation.
    pub const INSUFFICIENT_BALANCE: i32 = -32603;
    /// The entry point is well formed but not served by this instance.
    pub const UNSUPPORTED_ENTRY_POINT: i32 = -32604;
    /// Unexpected failure inside the service.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// A single validation failure, located by its dotted path inside the params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} at \"{}\"", self.message, self.path)
        }
    }
}

/// Every reason a payload was rejected, in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![Issue::new(path, message)])
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Prefixes every issue message, used to label which schema produced it.
    pub fn labelled(self, label: &str) -> Self {
        Self::new(
            self.issues
                .into_iter()
                .map(|issue| Issue::new(issue.path, format!("[{label}] {}", issue.message)))
                .collect(),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validation error: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Errors surfaced to JSON-RPC callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymasterError {
    #[error("{0}")]
    InvalidFields(#[from] ValidationError),

    #[error("{0}")]
    InsufficientBalance(String),

    #[error("{0}")]
    UnsupportedEntryPoint(String),

    /// Defects rather than bad input.
    #[error("{0}")]
    InternalBundlerError(String),

    #[error("Method {0} is not supported")]
    MethodNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl PaymasterError {
    pub fn internal() -> Self {
        Self::InternalBundlerError("Internal error from bundler".to_string())
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidFields(_) => codes::INVALID_FIELDS,
            Self::InsufficientBalance(_) => codes::INSUFFICIENT_BALANCE,
            Self::UnsupportedEntryPoint(_) => codes::UNSUPPORTED_ENTRY_POINT,
            Self::InternalBundlerError(_) => codes::INTERNAL_ERROR,
            Self::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            Self::ParseError(_) => codes::PARSE_ERROR,
        }
    }
}
