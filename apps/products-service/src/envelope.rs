//! Request and reply framing for message patterns.
//!
//! Requests arrive either wrapped as `{ "pattern": ..., "data": ..., "id": ... }`
//! or as the bare payload. Replies always use the wrapped form:
//! `{ "response": ..., "isDisposed": true }` or `{ "err": ..., "isDisposed": true }`,
//! echoing the request `id` when there was one.

use domain_products::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded inbound request. The pattern itself is taken from the subject.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRequest {
    pub data: Value,
    pub id: Option<Value>,
}

impl IncomingRequest {
    /// Decode raw message bytes. An empty body carries a `null` payload.
    pub fn decode(payload: &[u8]) -> Result<Self, RpcError> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::bare(Value::Null));
        }

        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| RpcError::bad_request(format!("Malformed JSON payload: {}", e)))?;

        match value {
            Value::Object(mut map) if map.contains_key("data") => Ok(Self {
                data: map.remove("data").unwrap_or(Value::Null),
                id: map.remove("id"),
            }),
            other => Ok(Self::bare(other)),
        }
    }

    fn bare(data: Value) -> Self {
        Self { data, id: None }
    }
}

/// Outbound reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<RpcError>,
    pub is_disposed: bool,
}

impl OutgoingResponse {
    pub fn from_result(id: Option<Value>, result: Result<Value, RpcError>) -> Self {
        let (response, err) = match result {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err)),
        };

        Self {
            id,
            response,
            err,
            is_disposed: true,
        }
    }
}
