//! JSON-RPC 2.0 envelope handling

use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// Error object of a JSON-RPC response
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message} ({code})")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(detail: impl ToString) -> Self {
        Self::new(PARSE_ERROR, "Parse error").with_data(detail.to_string())
    }

    pub fn invalid_request(detail: impl ToString) -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request").with_data(detail.to_string())
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method {} not found", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    fn with_data(mut self, detail: String) -> Self {
        self.data = Some(Value::String(detail));
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    /// `None` when the member is absent (a notification), `Some(Null)` for
    /// an explicit `null` id
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// Run one request or a batch through `call`. Returns `None` when nothing
/// must be sent back (notifications only). Batch entries run in order.
pub async fn handle_payload<F, Fut>(body: &[u8], call: F) -> Option<Value>
where
    F: Fn(String, Option<Value>) -> Fut,
    Fut: Future<Output = Result<Value, RpcError>>,
{
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => return Some(to_value(RpcResponse::failure(Value::Null, RpcError::parse_error(e)))),
    };

    match payload {
        Value::Array(batch) if batch.is_empty() => Some(to_value(RpcResponse::failure(
            Value::Null,
            RpcError::invalid_request("empty batch"),
        ))),
        Value::Array(batch) => {
            let mut responses = Vec::with_capacity(batch.len());
            for request in batch {
                if let Some(response) = handle_single(request, &call).await {
                    responses.push(to_value(response));
                }
            }
            (!responses.is_empty()).then_some(Value::Array(responses))
        }
        single => handle_single(single, &call).await.map(to_value),
    }
}

async fn handle_single<F, Fut>(request: Value, call: &F) -> Option<RpcResponse>
where
    F: Fn(String, Option<Value>) -> Fut,
    Fut: Future<Output = Result<Value, RpcError>>,
{
    let request: RpcRequest = match serde_json::from_value(request) {
        Ok(request) => request,
        Err(e) => return Some(RpcResponse::failure(Value::Null, RpcError::invalid_request(e))),
    };

    if request.jsonrpc != JSONRPC_VERSION {
        let id = request.id.unwrap_or(Value::Null);
        return Some(RpcResponse::failure(
            id,
            RpcError::invalid_request(format!("unsupported jsonrpc version {:?}", request.jsonrpc)),
        ));
    }

    let outcome = call(request.method, request.params).await;
    let id = request.id?;
    Some(match outcome {
        Ok(result) => RpcResponse::success(id, result),
        Err(error) => RpcResponse::failure(id, error),
    })
}

fn to_value(response: RpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
