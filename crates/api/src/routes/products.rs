//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use common::ProductId;
use serde::Serialize;
use store::{ProductRecord, Store};

use super::{Success, success};
use crate::AppState;
use crate::error::{ApiError, ApiPath};

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub price_cents: i64,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub stock: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price.to_string(),
            price_cents: product.price.cents(),
            image: product.image,
            category_id: product.category_id,
            stock: product.stock,
            featured: product.featured,
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductsBody {
    pub products: Vec<ProductResponse>,
}

#[derive(Debug, Serialize)]
pub struct ProductBody {
    pub product: ProductResponse,
}

/// GET /products: active products, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Success<ProductsBody>>, ApiError> {
    let products = state.catalog.list_products().await?;
    Ok(success(ProductsBody {
        products: products.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// GET /products/{id}: one active product.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Success<ProductBody>>, ApiError> {
    let product = state.catalog.get_product(ProductId::new(id)).await?;
    Ok(success(ProductBody {
        product: product.into(),
    }))
}
