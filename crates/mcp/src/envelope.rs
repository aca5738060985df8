// Request envelope parsing and structural validation

use crate::error::GatewayError;
use crate::protocol::{JsonRpcRequest, JSONRPC_VERSION};
use serde_json::Value;

/// A request that failed validation, with whatever id could be recovered
#[derive(Debug)]
pub struct RejectedRequest {
    /// `null` when the body never parsed into an object
    pub id: Value,
    pub error: GatewayError,
}

impl RejectedRequest {
    fn new(id: Value, error: GatewayError) -> Self {
        Self { id, error }
    }
}

/// Parse raw bytes into a validated request envelope.
///
/// Checks, in order: non-blank body, valid JSON, a single object, the exact
/// `"2.0"` version tag, a string method, and an object (or absent) `params`.
pub fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, RejectedRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RejectedRequest::new(
            Value::Null,
            GatewayError::parse("Request body cannot be empty"),
        ));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RejectedRequest::new(Value::Null, GatewayError::from(e)))?;

    let Value::Object(mut object) = value else {
        return Err(RejectedRequest::new(
            Value::Null,
            GatewayError::invalid_request("Request must be a JSON object"),
        ));
    };

    let id = object.remove("id").unwrap_or(Value::Null);
    let reject = |message: &str| {
        Err(RejectedRequest::new(
            id.clone(),
            GatewayError::invalid_request(message),
        ))
    };

    match object.get("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(_) => return reject("Invalid JSON-RPC version. Must be \"2.0\""),
        None => return reject("Missing jsonrpc field"),
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => return reject("Method must be a string"),
        None => return reject("Missing method field"),
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => return reject("params must be an object"),
    };

    Ok(JsonRpcRequest {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        method,
        params,
    })
}
