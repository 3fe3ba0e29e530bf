//! Persisted cart endpoints. All require a logged-in user.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::ProductId;
use domain::{CartView, Identity};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{Success, success};
use crate::AppState;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::session::RequireAuth;

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub product_id: ProductId,
    pub name: String,
    pub price: String,
    pub price_cents: i64,
    pub image: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub item_count: u32,
    pub subtotal: String,
    pub subtotal_cents: i64,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        Self {
            item_count: view.lines.iter().map(|line| line.quantity).sum(),
            subtotal: view.subtotal.to_string(),
            subtotal_cents: view.subtotal.cents(),
            lines: view
                .lines
                .into_iter()
                .map(|line| CartLineResponse {
                    product_id: line.product_id,
                    name: line.name,
                    price: line.price.to_string(),
                    price_cents: line.price.cents(),
                    image: line.image,
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartBody {
    pub cart: CartResponse,
}

async fn current_cart<S: Store>(
    state: &AppState<S>,
    identity: &Identity,
) -> Result<Json<Success<CartBody>>, ApiError> {
    let view = state.cart.view(identity).await?;
    Ok(success(CartBody { cart: view.into() }))
}

/// GET /cart: the user's cart.
#[tracing::instrument(skip_all)]
pub async fn view<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Success<CartBody>>, ApiError> {
    current_cart(&state, &identity).await
}

/// POST /cart: add a product, merging with an existing line.
#[tracing::instrument(skip_all)]
pub async fn add<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    RequireAuth(identity): RequireAuth,
    ApiJson(request): ApiJson<CartItemRequest>,
) -> Result<Json<Success<CartBody>>, ApiError> {
    state
        .cart
        .add(&identity, request.product_id, request.quantity)
        .await?;
    current_cart(&state, &identity).await
}

/// PUT /cart: set the quantity of an existing line.
#[tracing::instrument(skip_all)]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    RequireAuth(identity): RequireAuth,
    ApiJson(request): ApiJson<CartItemRequest>,
) -> Result<Json<Success<CartBody>>, ApiError> {
    state
        .cart
        .update(&identity, request.product_id, request.quantity)
        .await?;
    current_cart(&state, &identity).await
}

/// DELETE /cart/{product_id}: remove a line.
#[tracing::instrument(skip(state, identity))]
pub async fn remove<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    RequireAuth(identity): RequireAuth,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<Json<Success<CartBody>>, ApiError> {
    state
        .cart
        .remove(&identity, ProductId::new(product_id))
        .await?;
    current_cart(&state, &identity).await
}
