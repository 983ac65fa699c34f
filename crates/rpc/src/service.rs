use std::fmt;
use std::time::Instant;

use jsonrpsee::types::ErrorObjectOwned;
use mock_paymaster_core::envelope::JSONRPC_VERSION;
use mock_paymaster_core::params::SUPPORTED_METHODS;
use mock_paymaster_core::{JsonRpcRequest, JsonRpcResponse, PaymasterError, PaymasterRequest};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::handler::PaymasterHandler;
use crate::metrics::{Metrics, UNKNOWN_METHOD, record_histogram};

/// Turns JSON-RPC bodies into JSON-RPC replies.
///
/// Every reply is an envelope: failures are reported through the `error`
/// member rather than as transport errors.
pub struct RpcService<H> {
    handler: H,
    metrics: Metrics,
}

impl<H> fmt::Debug for RpcService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcService").finish_non_exhaustive()
    }
}

impl<H: PaymasterHandler> RpcService<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            metrics: Metrics::default(),
        }
    }

    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Handles a raw request body, answering `-32700` when it is not JSON.
    pub async fn handle_bytes(&self, body: &[u8]) -> Value {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle(value).await,
            Err(e) => {
                warn!(message = "Failed to parse request body", error = %e);
                self.reject(Value::Null, &PaymasterError::ParseError(e.to_string()))
            }
        }
    }

    pub async fn handle(&self, body: Value) -> Value {
        let start = Instant::now();

        let request = match JsonRpcRequest::parse(&body) {
            Ok(request) => request,
            Err(e) => {
                self.metrics.validation_failures.increment(1);
                return self.reject(Value::Null, &PaymasterError::from(e));
            }
        };
        let id = Value::Number(request.id.clone());

        let outcome = self.dispatch(&request.method, &request.params).await;

        let elapsed = start.elapsed();
        record_histogram(elapsed, method_label(&request.method));
        self.metrics.request_duration.record(elapsed.as_secs_f64());

        match outcome {
            Ok(result) => {
                self.metrics.requests_accepted.increment(1);
                info!(
                    message = "Handled request",
                    method = %request.method,
                    duration_ms = elapsed.as_millis() as u64,
                );
                match serde_json::to_value(JsonRpcResponse::new(request.id, result)) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(message = "Failed to encode response", error = %e);
                        self.reject(id, &PaymasterError::internal())
                    }
                }
            }
            Err(e) => {
                if matches!(e, PaymasterError::InvalidFields(_)) {
                    self.metrics.validation_failures.increment(1);
                }
                self.reject(id, &e)
            }
        }
    }

    async fn dispatch(&self, method: &str, params: &[Value]) -> Result<Value, PaymasterError> {
        let request = PaymasterRequest::parse(method, params)?;

        debug!(
            message = "Dispatching request",
            method = request.method(),
            entry_point = %request.entry_point(),
            version = ?request.version(),
        );

        match request {
            PaymasterRequest::SponsorUserOperation(params) => {
                to_result(self.handler.sponsor_user_operation(params).await?)
            }
            PaymasterRequest::GetPaymasterStubData(params) => {
                to_result(self.handler.get_paymaster_stub_data(params).await?)
            }
            PaymasterRequest::GetPaymasterData(params) => {
                to_result(self.handler.get_paymaster_data(params).await?)
            }
            PaymasterRequest::GetTokenQuotes(params) => {
                to_result(self.handler.get_token_quotes(params).await?)
            }
        }
    }

    fn reject(&self, id: Value, error: &PaymasterError) -> Value {
        self.metrics.requests_rejected.increment(1);
        warn!(
            message = "Rejected request",
            code = error.code(),
            error = %error,
        );
        error_response(id, error)
    }
}

/// Bounded metric label for a caller-supplied method name.
fn method_label(method: &str) -> &'static str {
    SUPPORTED_METHODS
        .iter()
        .find(|supported| **supported == method)
        .copied()
        .unwrap_or(UNKNOWN_METHOD)
}

fn to_result<T: Serialize>(result: T) -> Result<Value, PaymasterError> {
    serde_json::to_value(result).map_err(|_| PaymasterError::internal())
}

/// Validation failures carry their issues as `data`.
pub fn error_object(error: &PaymasterError) -> ErrorObjectOwned {
    match error {
        PaymasterError::InvalidFields(validation) => {
            ErrorObjectOwned::owned(error.code(), error.to_string(), Some(validation.issues()))
        }
        _ => ErrorObjectOwned::owned(error.code(), error.to_string(), None::<()>),
    }
}

pub fn error_response(id: Value, error: &PaymasterError) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": error_object(error),
    })
}
