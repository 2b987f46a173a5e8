//! Product Service - Business logic layer

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, PageMeta, Paginated, PaginationQuery, Product, UpdateProduct};
use crate::repository::ProductRepository;

/// Product operations behind the message patterns.
///
/// Inputs are expected to be validated by the caller (see
/// [`crate::handlers::ProductRpcHandler`]).
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new, available product
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        self.repository.create(input).await
    }

    /// One page of available products with pagination metadata
    #[instrument(skip(self))]
    pub async fn list(&self, query: PaginationQuery) -> ProductResult<Paginated<Product>> {
        let offset = query.offset()?;
        let total = self.repository.count_available().await?;
        let data = self
            .repository
            .list_available(offset, query.limit)
            .await?;

        Ok(Paginated {
            data,
            meta: PageMeta {
                total,
                page: query.page,
                last_page: query.last_page(total),
            },
        })
    }

    /// Available product by id
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i32) -> ProductResult<Product> {
        self.repository
            .find_available(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Patch an available product. The id in `input` selects the row and is
    /// never written.
    #[instrument(skip(self, input), fields(product_id = input.id))]
    pub async fn update(&self, input: UpdateProduct) -> ProductResult<Product> {
        let (id, patch) = input.into_parts();
        let existing = self.get_by_id(id).await?;

        if patch.is_empty() {
            return Ok(existing);
        }

        self.repository.update(id, patch).await
    }

    /// Soft-delete: flips `available` to false, the row stays in the store
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> ProductResult<Product> {
        self.get_by_id(id).await?;
        self.repository.set_available(id, false).await
    }

    /// Check that every id refers to a stored product, available or not.
    ///
    /// Duplicate ids are collapsed before the lookup.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn validate_batch(&self, ids: Vec<i32>) -> ProductResult<Vec<Product>> {
        let distinct: Vec<i32> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let products = self.repository.find_by_ids(&distinct).await?;

        if products.len() < distinct.len() {
            let found: BTreeSet<i32> = products.iter().map(|p| p.id).collect();
            let missing: Vec<i32> = distinct
                .into_iter()
                .filter(|id| !found.contains(id))
                .collect();

            tracing::warn!(?missing, "Batch validation failed");
            return Err(ProductError::MissingProducts(missing));
        }

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductPatch;
    use crate::repository::{InMemoryProductRepository, MockProductRepository};
    use chrono::Utc;
    use mockall::predicate::eq;

    fn product(id: i32, name: &str, price: f64, available: bool) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: name.to_string(),
            price,
            available,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded(products: Vec<Product>) -> ProductService<InMemoryProductRepository> {
        let repo = InMemoryProductRepository::new();
        for p in products {
            repo.insert(p).await;
        }
        ProductService::new(repo)
    }

    #[tokio::test]
    async fn test_create_then_get_returns_available_product() {
        let service = ProductService::new(InMemoryProductRepository::new());

        let created = service
            .create(CreateProduct {
                name: "Monitor".to_string(),
                price: 199.0,
            })
            .await
            .unwrap();

        let fetched = service.get_by_id(created.id).await.unwrap();
        assert!(fetched.available);
        assert_eq!(fetched.name, "Monitor");
        assert_eq!(fetched.price, 199.0);
    }

    #[tokio::test]
    async fn test_list_skips_unavailable_products() {
        let service = seeded(vec![
            product(1, "A", 10.0, true),
            product(2, "B", 20.0, false),
        ])
        .await;

        let page = service.list(PaginationQuery::new(1, 10)).await.unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, 1);
        assert_eq!(
            page.meta,
            PageMeta {
                total: 1,
                page: 1,
                last_page: 1
            }
        );
    }

    #[tokio::test]
    async fn test_list_pages_never_exceed_limit() {
        let products = (1..=7).map(|id| product(id, "P", 1.0, true)).collect();
        let service = seeded(products).await;

        for page in 1..=4 {
            let result = service.list(PaginationQuery::new(page, 3)).await.unwrap();
            assert!(result.data.len() <= 3);
            assert_eq!(result.meta.total, 7);
            assert_eq!(result.meta.last_page, 3);
        }

        let last = service.list(PaginationQuery::new(3, 3)).await.unwrap();
        assert_eq!(last.data.len(), 1);
        let past_end = service.list(PaginationQuery::new(4, 3)).await.unwrap();
        assert!(past_end.data.is_empty());
    }

    #[tokio::test]
    async fn test_list_empty_store_has_no_last_page() {
        let service = ProductService::new(InMemoryProductRepository::new());

        let page = service.list(PaginationQuery::default()).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.meta.last_page, 0);
    }

    #[tokio::test]
    async fn test_list_out_of_range_page_never_reaches_repository() {
        // No expectations: any repository call would panic
        let service = ProductService::new(MockProductRepository::new());

        let result = service.list(PaginationQuery::new(u64::MAX, 10)).await;
        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_remove_then_get_is_not_found() {
        let service = seeded(vec![product(1, "A", 10.0, true)]).await;

        let removed = service.remove(1).await.unwrap();
        assert!(!removed.available);

        let result = service.get_by_id(1).await;
        assert!(matches!(result, Err(ProductError::NotFound(1))));
    }

    #[tokio::test]
    async fn test_remove_keeps_the_row() {
        let repo = InMemoryProductRepository::new();
        repo.insert(product(1, "A", 10.0, true)).await;
        let service = ProductService::new(repo.clone());

        service.remove(1).await.unwrap();

        let stored = repo.find_by_ids(&[1]).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].available);
    }

    #[tokio::test]
    async fn test_remove_twice_is_not_found() {
        let service = seeded(vec![product(1, "A", 10.0, true)]).await;

        service.remove(1).await.unwrap();
        let result = service.remove(1).await;
        assert!(matches!(result, Err(ProductError::NotFound(1))));
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let service = seeded(vec![product(1, "A", 10.0, true)]).await;

        let updated = service
            .update(UpdateProduct {
                id: 1,
                name: None,
                price: Some(12.5),
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "A");
        assert_eq!(updated.price, 12.5);
        assert!(updated.available);
    }

    #[tokio::test]
    async fn test_update_soft_deleted_product_is_not_found() {
        let service = seeded(vec![product(2, "B", 20.0, false)]).await;

        let result = service
            .update(UpdateProduct {
                id: 2,
                name: Some("Back".to_string()),
                price: None,
            })
            .await;

        assert!(matches!(result, Err(ProductError::NotFound(2))));
    }

    #[tokio::test]
    async fn test_update_checks_existence_before_writing() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_available()
            .with(eq(5))
            .returning(|_| Ok(None));
        mock_repo.expect_update().never();

        let service = ProductService::new(mock_repo);
        let result = service
            .update(UpdateProduct {
                id: 5,
                name: Some("Ghost".to_string()),
                price: None,
            })
            .await;

        assert!(matches!(result, Err(ProductError::NotFound(5))));
    }

    #[tokio::test]
    async fn test_update_writes_patch_without_id() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_available()
            .with(eq(1))
            .returning(|id| Ok(Some(product(id, "A", 10.0, true))));
        mock_repo
            .expect_update()
            .with(
                eq(1),
                eq(ProductPatch {
                    name: Some("Renamed".to_string()),
                    price: None,
                }),
            )
            .times(1)
            .returning(|id, _| Ok(product(id, "Renamed", 10.0, true)));

        let service = ProductService::new(mock_repo);
        let updated = service
            .update(UpdateProduct {
                id: 1,
                name: Some("Renamed".to_string()),
                price: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn test_validate_batch_collapses_duplicates() {
        let service = seeded(vec![
            product(1, "A", 10.0, true),
            product(2, "B", 20.0, true),
        ])
        .await;

        let with_duplicates = service.validate_batch(vec![1, 1, 2]).await.unwrap();
        let distinct = service.validate_batch(vec![1, 2]).await.unwrap();

        assert_eq!(with_duplicates, distinct);
        assert_eq!(distinct.len(), 2);
    }

    #[tokio::test]
    async fn test_validate_batch_accepts_soft_deleted_products() {
        let service = seeded(vec![
            product(1, "A", 10.0, true),
            product(2, "B", 20.0, false),
        ])
        .await;

        let products = service.validate_batch(vec![1, 2]).await.unwrap();
        assert_eq!(products.len(), 2);
    }

    #[tokio::test]
    async fn test_validate_batch_fails_on_unknown_id() {
        let service = seeded(vec![product(1, "A", 10.0, true)]).await;

        let result = service.validate_batch(vec![1, 3, 3]).await;
        match result {
            Err(ProductError::MissingProducts(missing)) => assert_eq!(missing, vec![3]),
            other => panic!("expected MissingProducts, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_batch_queries_distinct_ids_once() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_by_ids()
            .withf(|ids| ids == [1, 2])
            .times(1)
            .returning(|ids| Ok(ids.iter().map(|&id| product(id, "P", 1.0, true)).collect()));

        let service = ProductService::new(mock_repo);
        let products = service.validate_batch(vec![2, 1, 2, 1]).await.unwrap();
        assert_eq!(products.len(), 2);
    }
}
