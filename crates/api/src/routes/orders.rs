//! Checkout and order lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::ProductId;
use domain::{
    OrderStatus, OrderSubmission, PaymentMethod, PaymentStatus, PlacedLine, PlacedOrder,
};
use serde::Serialize;
use store::Store;

use super::{Success, success};
use crate::AppState;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::session::{OptionalAuth, RequireAuth};

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// The customer-facing order number.
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total: String,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub lines: Vec<OrderLineResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total: String,
}

impl From<PlacedLine> for OrderLineResponse {
    fn from(line: PlacedLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            unit_price: line.unit_price.to_string(),
            unit_price_cents: line.unit_price.cents(),
            quantity: line.quantity,
            line_total: line.line_total.to_string(),
        }
    }
}

impl From<PlacedOrder> for OrderResponse {
    fn from(order: PlacedOrder) -> Self {
        Self {
            id: order.order_number.into_inner(),
            created_at: order.created_at,
            total: order.total.to_string(),
            total_cents: order.total.cents(),
            status: order.status,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            lines: order.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderBody {
    pub order: OrderResponse,
}

#[derive(Debug, Serialize)]
pub struct OrdersBody {
    pub orders: Vec<OrderResponse>,
}

// -- Handlers --

/// POST /orders: place an order from a submitted cart.
///
/// The owner is the session identity, never a field of the body.
#[tracing::instrument(skip_all)]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    OptionalAuth(identity): OptionalAuth,
    body: Result<ApiJson<OrderSubmission>, ApiError>,
) -> Result<(StatusCode, Json<Success<OrderBody>>), ApiError> {
    // Login policy wins over body errors
    if state.require_login_for_checkout && identity.is_none() {
        return Err(ApiError::Unauthorized(
            "Please log in to place an order".to_string(),
        ));
    }
    let ApiJson(submission) = body?;

    let order = state
        .orders
        .place_order(identity.as_ref(), submission)
        .await?;

    Ok((
        StatusCode::CREATED,
        success(OrderBody {
            order: order.into(),
        }),
    ))
}

/// GET /orders: the logged-in user's orders, newest first.
#[tracing::instrument(skip_all)]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Success<OrdersBody>>, ApiError> {
    let orders = state.orders.list_orders(&identity).await?;
    Ok(success(OrdersBody {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

/// GET /orders/{order_number}: one order, if visible to the caller.
#[tracing::instrument(skip(state, identity))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    OptionalAuth(identity): OptionalAuth,
    ApiPath(order_number): ApiPath<String>,
) -> Result<Json<Success<OrderBody>>, ApiError> {
    let order = state
        .orders
        .get_order(&order_number, identity.as_ref())
        .await?;
    Ok(success(OrderBody {
        order: order.into(),
    }))
}
