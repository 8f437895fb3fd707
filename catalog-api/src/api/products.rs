use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::models::product::{ImageUpload, Product, ProductSubmission};
use crate::error::AppError;
use crate::server::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/products", get(list_products).post(create_product))
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub success: bool,
    pub image_url: String,
}

async fn list_products(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state
        .products
        .list_products()
        .await
        .map_err(|e| e.during("Database error"))?;

    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CreateProductResponse>, AppError> {
    // a non-multipart body carries none of the required fields
    let submission = match multipart {
        Ok(multipart) => read_submission(multipart).await?,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Request body is not multipart");
            ProductSubmission::default()
        }
    };

    let created = state
        .products
        .create_product(submission)
        .await
        .map_err(|e| e.during("Error adding product"))?;

    Ok(Json(CreateProductResponse {
        success: true,
        image_url: created.image_url,
    }))
}

async fn read_submission(mut multipart: Multipart) -> Result<ProductSubmission, AppError> {
    let mut submission = ProductSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        match field_name.as_str() {
            "name" => submission.name = Some(field.text().await?).filter(|t| !t.is_empty()),
            "price" => submission.price = Some(field.text().await?).filter(|t| !t.is_empty()),
            // an empty description is still a description
            "description" => submission.description = Some(field.text().await?),
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                // browsers send an empty part when no file was chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                submission.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(submission)
}
