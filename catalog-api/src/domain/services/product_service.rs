use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::domain::models::product::{CreatedProduct, NewProduct, Product, ProductSubmission};
use crate::error::AppError;
use crate::infrastructure::repository::ProductRepository;
use crate::infrastructure::storage::{storage_key, ImageStore};

pub const MISSING_FIELDS: &str = "Missing fields";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Product ingestion and listing over injected storage and repository.
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageStore>,
    public_origin: String,
    cleanup_on_failure: bool,
}

impl ProductService {
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        images: Arc<dyn ImageStore>,
        public_origin: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            images,
            public_origin: public_origin.into(),
            cleanup_on_failure: false,
        }
    }

    pub fn with_cleanup_on_failure(mut self, enabled: bool) -> Self {
        self.cleanup_on_failure = enabled;
        self
    }

    /// Checks presence, uploads the image, then inserts the row. `price` goes
    /// to the database as submitted, so text the column rejects fails the
    /// insert after the upload. The two writes are not atomic: unless cleanup
    /// is enabled, a failed insert leaves the uploaded object behind.
    pub async fn create_product(&self, submission: ProductSubmission) -> Result<CreatedProduct, AppError> {
        if let Err(errors) = submission.validate() {
            tracing::warn!(fields = ?errors.field_errors().keys().collect::<Vec<_>>(), "Missing fields");
            return Err(AppError::Validation(MISSING_FIELDS.to_string()));
        }
        let ProductSubmission {
            name: Some(name),
            description,
            price: Some(price),
            image: Some(image),
        } = submission
        else {
            return Err(AppError::Validation(MISSING_FIELDS.to_string()));
        };

        let key = storage_key(&image.file_name, Utc::now());
        let content_type = image
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        let image_url = self.images.put(&key, image.bytes, content_type).await?;

        let product = NewProduct {
            name,
            description,
            price,
            image_url,
        };

        let id = match self.repository.insert(&product).await {
            Ok(id) => id,
            Err(e) => {
                if self.cleanup_on_failure {
                    self.discard_upload(&key).await;
                }
                return Err(e);
            }
        };

        tracing::info!(id, name = %product.name, image_url = %product.image_url, "Product created");

        Ok(CreatedProduct {
            id,
            image_url: product.image_url,
        })
    }

    /// Every product, newest first, with image locations made absolute.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let mut products = self.repository.list_newest_first().await?;

        for product in &mut products {
            if let Some(locator) = product.image_url.as_mut() {
                *locator = absolute_locator(&self.public_origin, locator);
            }
        }

        Ok(products)
    }

    async fn discard_upload(&self, key: &str) {
        match self.images.delete(key).await {
            Ok(()) => tracing::info!(key, "Removed orphaned upload"),
            Err(e) => tracing::error!(key, error = %e, "Failed to remove orphaned upload"),
        }
    }
}

/// Prefixes `origin` onto locators that have no URL scheme.
pub fn absolute_locator(origin: &str, locator: &str) -> String {
    if locator.is_empty() || has_scheme(locator) {
        return locator.to_string();
    }

    let origin = origin.trim_end_matches('/');
    if locator.starts_with('/') {
        format!("{origin}{locator}")
    } else {
        format!("{origin}/{locator}")
    }
}

fn has_scheme(locator: &str) -> bool {
    let Some((scheme, _)) = locator.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
