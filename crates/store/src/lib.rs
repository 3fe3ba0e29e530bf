//! Persistence layer for the Trendify storefront.
//!
//! Two backends implement the same traits: [`InMemoryStore`] for tests and
//! local runs, and [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::{PostgresStore, connect};
pub use records::{
    CartLineRecord, InsertedOrder, NewOrder, NewOrderLine, NewProduct, NewUser, OrderLineRecord,
    OrderRecord, ProductRecord, UserRecord,
};
pub use store::{CartStore, CatalogStore, OrderStore, OrderTransaction, Store, UserStore};
