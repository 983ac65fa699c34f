//! JSON-RPC 2.0 envelopes.
//!
//! Only the outer shape is checked here. The params stay untyped until the
//! method selects its own schema.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::ValidationError;
use crate::primitives::type_name;
use crate::schema::ObjectReader;

pub const JSONRPC_VERSION: &str = "2.0";

const REQUEST_KEYS: [&str; 4] = ["jsonrpc", "id", "method", "params"];
const RESPONSE_KEYS: [&str; 3] = ["jsonrpc", "id", "result"];

fn version(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(JSONRPC_VERSION) => Ok(()),
        _ => Err(format!("Invalid literal value, expected \"{JSONRPC_VERSION}\"")),
    }
}

fn integer_id(value: &Value) -> Result<Number, String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.clone()),
        Value::Number(_) => Err("Expected integer, received float".to_string()),
        other => Err(format!("Expected number, received {}", type_name(other))),
    }
}

fn method(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("Expected string, received {}", type_name(value)))
}

fn params(value: &Value) -> Result<Vec<Value>, String> {
    value
        .as_array()
        .cloned()
        .ok_or_else(|| format!("Expected array, received {}", type_name(value)))
}

/// A request whose envelope is well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRpcRequest {
    pub id: Number,
    pub method: String,
    pub params: Vec<Value>,
}

impl JsonRpcRequest {
    /// Unknown top-level keys are rejected and a missing `params` is empty.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        let reader = ObjectReader::closed(value, "", &REQUEST_KEYS)?;
        reader.required("jsonrpc", version)?;
        Ok(Self {
            id: reader.required("id", integer_id)?,
            method: reader.required("method", method)?,
            params: reader.optional("params", params)?.unwrap_or_default(),
        })
    }
}

/// A success envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    pub id: Number,
    pub result: Value,
}

impl JsonRpcResponse {
    pub const fn new(id: Number, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }

    /// `result` must be present but may be any value, `null` included.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        let reader = ObjectReader::closed(value, "", &RESPONSE_KEYS)?;
        reader.required("jsonrpc", version)?;
        Ok(Self::new(
            reader.required("id", integer_id)?,
            reader.required("result", |result| Ok(result.clone()))?,
        ))
    }
}
