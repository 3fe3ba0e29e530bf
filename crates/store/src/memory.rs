use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    CartLineRecord, InsertedOrder, NewOrder, NewOrderLine, NewProduct, NewUser, OrderLineRecord,
    OrderRecord, ProductRecord, Result, StoreError, UserRecord,
    store::{CartStore, CatalogStore, OrderStore, OrderTransaction, UserStore},
};

/// Failure points that can be armed on an [`InMemoryStore`].
///
/// Armed faults stay armed until their setter disarms them. A transaction
/// captures the faults that were armed when it began.
#[derive(Debug, Clone, Default)]
struct Faults {
    fail_catalog_read: bool,
    fail_order_insert: bool,
    fail_line_at: Option<usize>,
    fail_commit: bool,
}

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, ProductRecord>,
    next_product_id: i64,
    users: BTreeMap<UserId, (UserRecord, String)>,
    next_user_id: i64,
    carts: HashMap<UserId, Vec<(ProductId, u32)>>,
    orders: Vec<OrderRecord>,
    next_order_id: i64,
    faults: Faults,
}

/// In-memory store implementation for testing and local runs.
///
/// This implementation keeps all rows in memory and provides the same
/// interface and transactional guarantees as the PostgreSQL implementation:
/// order writes are staged per transaction and published in one step on
/// commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transactions fail when inserting the order header.
    pub async fn set_fail_on_order_insert(&self, fail: bool) {
        self.state.write().await.faults.fail_order_insert = fail;
    }

    /// Makes the next transactions fail when inserting the line at `index`
    /// (zero-based, counted per transaction).
    pub async fn set_fail_on_line(&self, index: Option<usize>) {
        self.state.write().await.faults.fail_line_at = index;
    }

    /// Makes the next transactions fail at commit time.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        self.state.write().await.faults.fail_commit = fail;
    }

    /// Makes catalog reads (`get_product`, `list_active_products`) fail.
    pub async fn set_fail_on_catalog_read(&self, fail: bool) {
        self.state.write().await.faults.fail_catalog_read = fail;
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of committed order lines across all orders.
    pub async fn order_line_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .iter()
            .map(|o| o.lines.len())
            .sum()
    }

    /// Marks a product active or inactive.
    pub async fn set_product_active(&self, id: ProductId, active: bool) {
        if let Some(product) = self.state.write().await.products.get_mut(&id) {
            product.active = active;
        }
    }

    /// Marks a user account active or inactive.
    pub async fn set_user_active(&self, id: UserId, active: bool) {
        if let Some((user, _)) = self.state.write().await.users.get_mut(&id) {
            user.active = active;
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_active_products(&self) -> Result<Vec<ProductRecord>> {
        let state = self.state.read().await;
        if state.faults.fail_catalog_read {
            return Err(StoreError::Injected("catalog read".to_string()));
        }
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let state = self.state.read().await;
        if state.faults.fail_catalog_read {
            return Err(StoreError::Injected(format!("catalog read of product {id}")));
        }
        Ok(state.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let mut state = self.state.write().await;
        state.next_product_id += 1;
        let record = ProductRecord {
            id: ProductId::new(state.next_product_id),
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category_id: product.category_id,
            stock: product.stock,
            featured: product.featured,
            active: product.active,
            created_at: Utc::now(),
        };
        state.products.insert(record.id, record.clone());
        Ok(record)
    }
}

/// A staged order write against an [`InMemoryStore`].
struct InMemoryOrderTransaction {
    state: Arc<RwLock<State>>,
    faults: Faults,
    header: Option<OrderRecord>,
}

#[async_trait]
impl OrderTransaction for InMemoryOrderTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<InsertedOrder> {
        if self.header.is_some() {
            return Err(StoreError::InvalidWrite(
                "order header already inserted in this transaction",
            ));
        }
        if self.faults.fail_order_insert {
            return Err(StoreError::Injected("order header insert".to_string()));
        }

        let mut state = self.state.write().await;
        if state
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
        }
        if let Some(user_id) = order.user_id
            && !state.users.contains_key(&user_id)
        {
            return Err(StoreError::ForeignKey(format!("user {user_id}")));
        }

        // Ids are consumed even if the transaction later rolls back, like a sequence
        state.next_order_id += 1;
        let inserted = InsertedOrder {
            id: OrderId::new(state.next_order_id),
            created_at: Utc::now(),
        };

        self.header = Some(OrderRecord {
            id: inserted.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            customer_name: order.customer_name.clone(),
            email: order.email.clone(),
            total: order.total,
            status: order.status.clone(),
            shipping_address: order.shipping_address.clone(),
            contact_phone: order.contact_phone.clone(),
            payment_method: order.payment_method.clone(),
            payment_status: order.payment_status.clone(),
            created_at: inserted.created_at,
            lines: Vec::new(),
        });

        Ok(inserted)
    }

    async fn insert_line(&mut self, line: &NewOrderLine) -> Result<()> {
        let header = self
            .header
            .as_mut()
            .ok_or_else(|| StoreError::ForeignKey("order header not inserted".to_string()))?;

        if self.faults.fail_line_at == Some(header.lines.len()) {
            return Err(StoreError::Injected(format!(
                "order line insert #{}",
                header.lines.len() + 1
            )));
        }
        if line.quantity == 0 {
            return Err(StoreError::InvalidWrite("order line quantity must be positive"));
        }
        if !self
            .state
            .read()
            .await
            .products
            .contains_key(&line.product_id)
        {
            return Err(StoreError::ForeignKey(format!("product {}", line.product_id)));
        }

        header.lines.push(OrderLineRecord {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            state,
            faults,
            header,
        } = *self;

        if faults.fail_commit {
            return Err(StoreError::Injected("commit".to_string()));
        }
        let Some(header) = header else {
            return Ok(());
        };

        let mut state = state.write().await;
        // Another transaction may have committed the same number since insert
        if state
            .orders
            .iter()
            .any(|o| o.order_number == header.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(header.order_number));
        }
        state.orders.push(header);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        if let Some(header) = &self.header {
            tracing::debug!(order_number = %header.order_number, "discarding staged order");
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn begin_order(&self) -> Result<Box<dyn OrderTransaction>> {
        let faults = self.state.read().await.faults.clone();
        Ok(Box::new(InMemoryOrderTransaction {
            state: Arc::clone(&self.state),
            faults,
            header: None,
        }))
    }

    async fn get_order(&self, order_number: &str) -> Result<Option<OrderRecord>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut state = self.state.write().await;
        if state.users.values().any(|(u, _)| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        state.next_user_id += 1;
        let record = UserRecord {
            id: UserId::new(state.next_user_id),
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            address: user.address,
            city: user.city,
            state: user.state,
            pincode: user.pincode,
            active: true,
            created_at: Utc::now(),
        };
        state
            .users
            .insert(record.id, (record.clone(), user.password_hash));
        Ok(record)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(&id)
            .map(|(u, _)| u.clone()))
    }

    async fn get_credentials(&self, email: &str) -> Result<Option<(UserRecord, String)>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|(u, _)| u.email == email)
            .cloned())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLineRecord>> {
        let state = self.state.read().await;
        let Some(lines) = state.carts.get(&user_id) else {
            return Ok(Vec::new());
        };

        Ok(lines
            .iter()
            .filter_map(|(product_id, quantity)| {
                state.products.get(product_id).map(|p| CartLineRecord {
                    product_id: p.id,
                    name: p.name.clone(),
                    price: p.price,
                    image: p.image.clone(),
                    quantity: *quantity,
                })
            })
            .collect())
    }

    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::ForeignKey(format!("user {user_id}")));
        }
        if !state.products.contains_key(&product_id) {
            return Err(StoreError::ForeignKey(format!("product {product_id}")));
        }

        let lines = state.carts.entry(user_id).or_default();
        let line = lines.iter_mut().find(|(id, _)| *id == product_id);
        let existing = line.as_ref().map_or(0, |entry| entry.1);
        if existing.saturating_add(quantity) > max_quantity {
            return Ok(false);
        }
        match line {
            Some((_, current)) => *current += quantity,
            None => lines.push((product_id, quantity)),
        }
        Ok(true)
    }

    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let line = state
            .carts
            .get_mut(&user_id)
            .and_then(|lines| lines.iter_mut().find(|(id, _)| *id == product_id));

        match line {
            Some((_, existing)) => {
                *existing = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_from_cart(&self, user_id: UserId, product_id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(lines) = state.carts.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = lines.len();
        lines.retain(|(id, _)| *id != product_id);
        Ok(lines.len() != before)
    }
}
