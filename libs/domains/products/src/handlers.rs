//! Message-pattern router for the products service.
//!
//! Each inbound message carries a pattern name and a JSON payload. The router
//! coerces and validates the payload, calls the matching [`ProductService`]
//! operation and serializes the result. It has no business logic of its own.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, instrument};
use validator::Validate;

use crate::error::{ProductError, ProductResult, RpcError};
use crate::models::{CreateProduct, PaginationQuery, UpdateProduct};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// Optionally negative run of digits
static NUMERIC_STRING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());

/// Message patterns served by the products service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ProductPattern {
    CreateProduct,
    FindAllProducts,
    FindOneProduct,
    UpdateProduct,
    DeleteProduct,
    ValidateProducts,
}

/// `validate_products` takes a bare id array; `{ "ids": [...] }` is accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValidateProductsPayload {
    Ids(Vec<i32>),
    Wrapped { ids: Vec<i32> },
}

impl ValidateProductsPayload {
    fn into_ids(self) -> Vec<i32> {
        match self {
            Self::Ids(ids) | Self::Wrapped { ids } => ids,
        }
    }
}

/// Dispatches message patterns to a [`ProductService`]
pub struct ProductRpcHandler<R: ProductRepository> {
    service: ProductService<R>,
}

impl<R: ProductRepository> Clone for ProductRpcHandler<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<R: ProductRepository> ProductRpcHandler<R> {
    pub fn new(service: ProductService<R>) -> Self {
        Self { service }
    }

    /// Handle a message by pattern name
    pub async fn handle(&self, pattern: &str, payload: Value) -> Result<Value, RpcError> {
        let pattern: ProductPattern = pattern.parse().map_err(|_| {
            RpcError::bad_request(format!(
                "There is no matching message handler for '{}'",
                pattern
            ))
        })?;

        self.dispatch(pattern, payload).await
    }

    #[instrument(skip(self, payload), fields(pattern = %pattern))]
    pub async fn dispatch(
        &self,
        pattern: ProductPattern,
        payload: Value,
    ) -> Result<Value, RpcError> {
        debug!("Dispatching message");

        match pattern {
            ProductPattern::CreateProduct => {
                let input: CreateProduct = parse_payload(payload)?;
                respond(self.service.create(input).await)
            }
            ProductPattern::FindAllProducts => {
                let query: PaginationQuery = if payload.is_null() {
                    PaginationQuery::default()
                } else {
                    parse_payload(payload)?
                };
                respond(self.service.list(query).await)
            }
            ProductPattern::FindOneProduct => {
                let id = extract_id(&payload)?;
                respond(self.service.get_by_id(id).await)
            }
            ProductPattern::UpdateProduct => {
                let input: UpdateProduct = parse_payload(payload)?;
                respond(self.service.update(input).await)
            }
            ProductPattern::DeleteProduct => {
                let id = extract_id(&payload)?;
                respond(self.service.remove(id).await)
            }
            ProductPattern::ValidateProducts => {
                let ids = serde_json::from_value::<ValidateProductsPayload>(payload)
                    .map_err(|_| RpcError::bad_request("Payload must be an array of product ids"))?
                    .into_ids();
                if ids.iter().any(|id| *id < 1) {
                    return Err(RpcError::bad_request("Product ids must be positive integers"));
                }
                respond(self.service.validate_batch(ids).await)
            }
        }
    }
}

/// Deserialize and validate a payload into a DTO
fn parse_payload<T>(payload: Value) -> Result<T, RpcError>
where
    T: DeserializeOwned + Validate,
{
    let input: T =
        serde_json::from_value(payload).map_err(|e| ProductError::Validation(e.to_string()))?;
    input
        .validate()
        .map_err(|e| ProductError::Validation(e.to_string()))?;
    Ok(input)
}

/// Pull `id` out of `{ "id": ... }` and coerce it to an integer
fn extract_id(payload: &Value) -> Result<i32, RpcError> {
    let raw = payload
        .get("id")
        .ok_or_else(|| RpcError::bad_request("Payload is missing 'id'"))?;
    parse_int(raw)
}

fn parse_int(value: &Value) -> Result<i32, RpcError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) if NUMERIC_STRING.is_match(s) => s.parse().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ProductError::Validation("Validation failed (numeric string is expected)".into()).into()
    })
}

fn respond<T: Serialize>(result: ProductResult<T>) -> Result<Value, RpcError> {
    let value = result?;
    serde_json::to_value(value).map_err(|e| ProductError::Internal(e.to_string()).into())
}
