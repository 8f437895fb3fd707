use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

/// A persisted catalog entry. Rows are append-only.
///
/// `id` is signed and `image_url` nullable so tables created by earlier
/// deployments (`INT` id, nullable `TEXT`) decode as well.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row values supplied by the ingestion pipeline; `id` and `created_at`
/// come from the database. `price` is the submitted text, left for the
/// `DECIMAL(10,2)` column to convert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Raw form fields as received. Empty `name` and `price` are stored as
/// `None`; `description` keeps whatever text was sent.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProductSubmission {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(required, length(min = 1))]
    pub price: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedProduct {
    pub id: u64,
    pub image_url: String,
}
