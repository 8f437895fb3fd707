//! In-memory stand-ins for the database and image store used by router tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::AppConfig;
use crate::domain::models::product::{NewProduct, Product};
use crate::domain::services::product_service::ProductService;
use crate::error::AppError;
use crate::infrastructure::repository::ProductRepository;
use crate::infrastructure::storage::{ImageStore, StorageError};
use crate::server::{create_app, AppState};

#[derive(Default)]
pub struct InMemoryProductRepository {
    rows: Mutex<Vec<Product>>,
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    /// Converts `price` the way a strict-mode `DECIMAL(10,2)` column does.
    async fn insert(&self, product: &NewProduct) -> Result<u64, AppError> {
        let price = Decimal::from_str(product.price.trim())
            .map_err(|_| {
                sqlx::Error::Protocol(format!(
                    "Incorrect decimal value: '{}' for column 'price'",
                    product.price
                ))
            })?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as u64 + 1;
        rows.push(Product {
            id: id as i64,
            name: product.name.clone(),
            description: product.description.clone(),
            price,
            image_url: Some(product.image_url.clone()),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_newest_first(&self) -> Result<Vec<Product>, AppError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryImageStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(format!("/uploads/{key}"))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Full router over in-memory collaborators and default configuration.
pub fn test_app() -> Router {
    test_app_with(&[])
}

/// Same as [`test_app`] with `APP__*` style overrides applied to the config.
pub fn test_app_with(vars: &[(&str, &str)]) -> Router {
    let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let config = AppConfig::from_sources("does/not/exist/catalog", vars).unwrap();
    let products = ProductService::new(
        Arc::new(InMemoryProductRepository::default()),
        Arc::new(InMemoryImageStore::default()),
        config.public_origin(),
    );

    create_app(AppState {
        config: Arc::new(config),
        products: Arc::new(products),
    })
}
