//! Order placement.
//!
//! A checkout passes through three stages:
//! - [`OrderSubmission::validate`] checks the submission without touching the store
//! - [`PricingResolver`] prices every line from the catalog of record
//! - [`OrderWriter`] persists header and lines in one transaction
//!
//! [`OrderService`] composes them and exposes order lookups.

mod intake;
mod number;
mod pricing;
mod service;
mod state;
mod value_objects;
mod writer;

use std::fmt;

use chrono::{DateTime, Utc};
use common::{Money, ProductId, UserId};
use serde::Serialize;
use store::{OrderRecord, StoreError};
use thiserror::Error;

use crate::error::ValidationError;

pub use intake::{CartLine, OrderSubmission, ShippingDetails, SubmittedLine, ValidatedOrder};
pub use number::{OrderNumber, OrderNumberGenerator, random_order_numbers};
pub use pricing::{PricedCart, PricingResolver, ResolvedLine};
pub use service::OrderService;
pub use state::{Placement, PlacementState};
pub use value_objects::{OrderStatus, PaymentMethod, PaymentStatus, Quantity, UnknownValue};
pub use writer::OrderWriter;

/// Why a product could not be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailability {
    Missing,
    Inactive,
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailability::Missing => f.write_str("does not exist"),
            Unavailability::Inactive => f.write_str("is no longer available"),
        }
    }
}

/// Errors that can occur while placing or reading orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The submission was rejected before any store access.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced product is missing or inactive.
    #[error("Product {product_id} {reason}")]
    ProductUnavailable {
        product_id: ProductId,
        reason: Unavailability,
    },

    /// No visible order has this number.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The store failed; nothing was persisted.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl OrderError {
    /// Label used for the `reason` dimension of failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "validation",
            OrderError::ProductUnavailable { .. } => "product_unavailable",
            OrderError::NotFound(_) => "not_found",
            OrderError::Persistence(_) => "persistence",
        }
    }
}

/// A committed order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// A committed order as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order_number: OrderNumber,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub lines: Vec<PlacedLine>,
}

impl TryFrom<OrderRecord> for PlacedOrder {
    type Error = StoreError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let corrupt = |e: UnknownValue| {
            StoreError::Corrupt(format!("order {}: {e}", record.order_number))
        };
        let status = record.status.parse::<OrderStatus>().map_err(corrupt)?;
        let payment_method = record.payment_method.parse::<PaymentMethod>().map_err(corrupt)?;
        let payment_status = record.payment_status.parse::<PaymentStatus>().map_err(corrupt)?;

        Ok(Self {
            order_number: OrderNumber::from_string(record.order_number),
            user_id: record.user_id,
            created_at: record.created_at,
            total: record.total,
            status,
            payment_method,
            payment_status,
            lines: record
                .lines
                .into_iter()
                .map(|line| PlacedLine {
                    product_id: line.product_id,
                    name: line.product_name,
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    line_total: line.line_total,
                })
                .collect(),
        })
    }
}
