//! Row-level records read from and written to the store.
//!
//! These mirror the relational schema in `migrations/` and carry no business
//! rules; the domain crate converts them into validated types.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub stock: i32,
    pub featured: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A product to insert into the catalog.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub stock: i32,
    pub featured: bool,
    pub active: bool,
}

impl NewProduct {
    /// Creates an active, non-featured product with no stock recorded.
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            image: None,
            category_id: None,
            stock: 0,
            featured: false,
            active: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn stock(mut self, stock: i32) -> Self {
        self.stock = stock;
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// An order header to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub total: Money,
    pub status: String,
    pub shipping_address: String,
    pub contact_phone: String,
    pub payment_method: String,
    pub payment_status: String,
}

/// The keys assigned to a freshly inserted order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedOrder {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
}

/// An order line to insert under an existing header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A committed order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub total: Money,
    pub status: String,
    pub shipping_address: String,
    pub contact_phone: String,
    pub payment_method: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineRecord>,
}

/// A committed order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A registered user (without credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user to register. `password_hash` must already be a PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

/// A stored cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineRecord {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: Option<String>,
    pub quantity: u32,
}
