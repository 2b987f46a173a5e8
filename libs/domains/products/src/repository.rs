use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductPatch};

/// Repository trait for Product persistence.
///
/// Methods named `*_available` only see products with `available = true`.
/// The rest address rows regardless of availability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new, available product
    async fn create(&self, input: CreateProduct) -> ProductResult<Product>;

    /// Number of available products
    async fn count_available(&self) -> ProductResult<u64>;

    /// Window of available products in ascending id order
    async fn list_available(&self, offset: u64, limit: u64) -> ProductResult<Vec<Product>>;

    /// Available product with the given id
    async fn find_available(&self, id: i32) -> ProductResult<Option<Product>>;

    /// Apply a patch; fails with `NotFound` when no row has this id
    async fn update(&self, id: i32, patch: ProductPatch) -> ProductResult<Product>;

    /// Write the availability flag; fails with `NotFound` when no row has this id
    async fn set_available(&self, id: i32, available: bool) -> ProductResult<Product>;

    /// Every stored product whose id is in `ids`, available or not
    async fn find_by_ids(&self, ids: &[i32]) -> ProductResult<Vec<Product>>;
}

#[derive(Debug, Default)]
struct Store {
    products: BTreeMap<i32, Product>,
    last_id: i32,
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product as-is, keeping its id
    pub async fn insert(&self, product: Product) {
        let mut store = self.store.write().await;
        store.last_id = store.last_id.max(product.id);
        store.products.insert(product.id, product);
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let mut store = self.store.write().await;

        store.last_id += 1;
        let now = Utc::now();
        let product = Product {
            id: store.last_id,
            name: input.name,
            price: input.price,
            available: true,
            created_at: now,
            updated_at: now,
        };
        store.products.insert(product.id, product.clone());

        tracing::info!(product_id = product.id, "Created product");
        Ok(product)
    }

    async fn count_available(&self) -> ProductResult<u64> {
        let store = self.store.read().await;
        Ok(store.products.values().filter(|p| p.available).count() as u64)
    }

    async fn list_available(&self, offset: u64, limit: u64) -> ProductResult<Vec<Product>> {
        let store = self.store.read().await;

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(store
            .products
            .values()
            .filter(|p| p.available)
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn find_available(&self, id: i32) -> ProductResult<Option<Product>> {
        let store = self.store.read().await;
        Ok(store.products.get(&id).filter(|p| p.available).cloned())
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> ProductResult<Product> {
        let mut store = self.store.write().await;
        let product = store
            .products
            .get_mut(&id)
            .ok_or(ProductError::NotFound(id))?;

        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        product.updated_at = Utc::now();

        tracing::info!(product_id = id, "Updated product");
        Ok(product.clone())
    }

    async fn set_available(&self, id: i32, available: bool) -> ProductResult<Product> {
        let mut store = self.store.write().await;
        let product = store
            .products
            .get_mut(&id)
            .ok_or(ProductError::NotFound(id))?;

        product.available = available;
        product.updated_at = Utc::now();

        tracing::info!(product_id = id, available, "Set product availability");
        Ok(product.clone())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> ProductResult<Vec<Product>> {
        let store = self.store.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| store.products.get(id))
            .cloned()
            .collect())
    }
}
