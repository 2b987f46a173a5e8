use http::StatusCode;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found with id {0}")]
    NotFound(i32),

    #[error("Some products were not found: {0:?}")]
    MissingProducts(Vec<i32>),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl From<DbErr> for ProductError {
    fn from(err: DbErr) -> Self {
        ProductError::Database(err.to_string())
    }
}

/// Error object returned to the caller of a message pattern.
///
/// Serialized as `{ "status": 404, "message": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message} (status {status})")]
pub struct RpcError {
    pub status: u16,
    pub message: String,
}

impl RpcError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<ProductError> for RpcError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => RpcError::not_found(err.to_string()),
            ProductError::MissingProducts(_) => {
                RpcError::bad_request("Some products were not found")
            }
            ProductError::Validation(msg) => RpcError::bad_request(msg),
            // Store details stay in the logs
            ProductError::Database(_) | ProductError::Internal(_) => {
                tracing::error!(error = %err, "Product operation failed");
                RpcError::internal("Internal server error")
            }
        }
    }
}
