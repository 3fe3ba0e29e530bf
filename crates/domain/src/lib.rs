//! Domain layer for the Trendify storefront.
//!
//! This crate provides the storefront's business rules:
//! - Order placement: validation, server-side pricing and atomic writing
//! - Catalog reads limited to active products
//! - Persisted carts for signed-in users
//! - Registration and password login producing an [`Identity`]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod email;
pub mod error;
pub mod identity;
pub mod order;

pub use auth::{AuthError, AuthService, RegisterUser};
pub use cart::{CartError, CartService, CartView};
pub use catalog::{CatalogError, CatalogService};
pub use email::Email;
pub use error::ValidationError;
pub use identity::{Identity, Role};
pub use order::{
    OrderError, OrderNumber, OrderService, OrderStatus, OrderSubmission, PaymentMethod,
    PaymentStatus, PlacedLine, PlacedOrder, PlacementState, SubmittedLine, Unavailability,
};
