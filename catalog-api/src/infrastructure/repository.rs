use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::domain::models::product::{NewProduct, Product};
use crate::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts one row and returns the id the database assigned.
    async fn insert(&self, product: &NewProduct) -> Result<u64, AppError>;

    /// All rows, highest id first.
    async fn list_newest_first(&self) -> Result<Vec<Product>, AppError>;
}

pub struct MySqlProductRepository {
    pool: MySqlPool,
}

impl MySqlProductRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for MySqlProductRepository {
    async fn insert(&self, product: &NewProduct) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, image_url)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.price)
        .bind(&product.image_url)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn list_newest_first(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, image_url, created_at
            FROM products
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}
