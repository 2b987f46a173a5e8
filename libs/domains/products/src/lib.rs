//! Products Domain
//!
//! Catalogue of products served over message patterns. Deleting a product is a
//! soft delete: the row stays in the store with `available = false` and
//! disappears from every read except batch validation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← Message patterns, payload coercion and validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business rules (existence checks, batch validation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + PostgreSQL / in-memory implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{PgProductRepository, ProductRpcHandler, ProductService};
//! use sea_orm::Database;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://localhost/products").await?;
//!
//! let service = ProductService::new(PgProductRepository::new(db));
//! let handler = ProductRpcHandler::new(service);
//!
//! let product = handler
//!     .handle("create_product", json!({ "name": "Lamp", "price": 15.5 }))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{ProductError, ProductResult, RpcError};
pub use handlers::{ProductPattern, ProductRpcHandler};
pub use models::{
    CreateProduct, PageMeta, Paginated, PaginationQuery, Product, ProductPatch, UpdateProduct,
};
pub use postgres::PgProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::ProductService;
