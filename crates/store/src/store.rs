use async_trait::async_trait;
use common::{ProductId, UserId};

use crate::{
    CartLineRecord, InsertedOrder, NewOrder, NewOrderLine, NewProduct, NewUser, OrderRecord,
    ProductRecord, Result, UserRecord,
};

/// Read access to the product catalog of record.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns all active products, newest first.
    async fn list_active_products(&self) -> Result<Vec<ProductRecord>>;

    /// Looks up a product by id regardless of its active flag.
    ///
    /// Returns None if no such product exists.
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    /// Inserts a product. Used for seeding and administration.
    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord>;
}

/// An open unit of work for writing one order.
///
/// Nothing written through a transaction is visible to readers until
/// [`OrderTransaction::commit`] succeeds. Dropping a transaction without
/// committing discards its writes.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Inserts the order header and returns its assigned keys.
    ///
    /// Fails with `DuplicateOrderNumber` if the order number is taken.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<InsertedOrder>;

    /// Inserts one line under the header inserted by this transaction.
    async fn insert_line(&mut self, line: &NewOrderLine) -> Result<()>;

    /// Makes every write of this transaction visible atomically.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every write of this transaction.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Opens a transaction for writing a single order.
    async fn begin_order(&self) -> Result<Box<dyn OrderTransaction>>;

    /// Loads a committed order with its lines by order number.
    async fn get_order(&self, order_number: &str) -> Result<Option<OrderRecord>>;

    /// Lists committed orders owned by a user, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>>;
}

/// User accounts and credentials.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user. Fails with `DuplicateEmail` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord>;

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Returns the user and their password hash for an email.
    async fn get_credentials(&self, email: &str) -> Result<Option<(UserRecord, String)>>;
}

/// Per-user persisted carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the user's cart joined with product data, oldest line first.
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLineRecord>>;

    /// Adds `quantity` to the line for `product_id`, creating it if absent.
    ///
    /// The merged quantity is checked against `max_quantity` atomically with
    /// the write. Returns false, leaving the line untouched, if it would
    /// exceed the cap.
    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
    ) -> Result<bool>;

    /// Sets the quantity of an existing line. Returns false if no line exists.
    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool>;

    /// Removes a line. Returns false if no line existed.
    async fn remove_from_cart(&self, user_id: UserId, product_id: ProductId) -> Result<bool>;
}

/// Everything the storefront needs from a backing store.
pub trait Store: CatalogStore + OrderStore + UserStore + CartStore + Clone + 'static {}

// Blanket implementation for every complete backend
impl<T> Store for T where T: CatalogStore + OrderStore + UserStore + CartStore + Clone + 'static {}
