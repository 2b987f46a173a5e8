use async_trait::async_trait;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{CreateProduct, Product, ProductPatch},
    repository::ProductRepository,
};

/// Ids bound per `IN (...)` query; Postgres caps a statement at 65535 parameters
const ID_BATCH_SIZE: usize = 10_000;

/// PostgreSQL-backed repository. Holds the process-wide connection pool.
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn available() -> sea_orm::Select<entity::Entity> {
        entity::Entity::find().filter(entity::Column::Available.eq(true))
    }

    async fn write(&self, id: i32, active_model: entity::ActiveModel) -> ProductResult<Product> {
        match active_model.update(&self.db).await {
            Ok(model) => Ok(model.into()),
            Err(DbErr::RecordNotUpdated) => Err(ProductError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn count_available(&self) -> ProductResult<u64> {
        Ok(Self::available().count(&self.db).await?)
    }

    async fn list_available(&self, offset: u64, limit: u64) -> ProductResult<Vec<Product>> {
        let models = Self::available()
            .order_by_asc(entity::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_available(&self, id: i32) -> ProductResult<Option<Product>> {
        let model = Self::available()
            .filter(entity::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> ProductResult<Product> {
        let mut active_model = entity::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };
        if let Some(name) = patch.name {
            active_model.name = Set(name);
        }
        if let Some(price) = patch.price {
            active_model.price = Set(price);
        }

        let product = self.write(id, active_model).await?;
        tracing::info!(product_id = id, "Updated product");
        Ok(product)
    }

    async fn set_available(&self, id: i32, available: bool) -> ProductResult<Product> {
        let active_model = entity::ActiveModel {
            id: Unchanged(id),
            available: Set(available),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let product = self.write(id, active_model).await?;
        tracing::info!(product_id = id, available, "Set product availability");
        Ok(product)
    }

    async fn find_by_ids(&self, ids: &[i32]) -> ProductResult<Vec<Product>> {
        let mut products = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(ID_BATCH_SIZE) {
            let models = entity::Entity::find()
                .filter(entity::Column::Id.is_in(chunk.iter().copied()))
                .all(&self.db)
                .await?;
            products.extend(models.into_iter().map(Product::from));
        }

        products.sort_by_key(|p| p.id);
        Ok(products)
    }
}
