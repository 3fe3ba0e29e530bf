use std::time::Duration;

use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::{
    CartLineRecord, InsertedOrder, NewOrder, NewOrderLine, NewProduct, NewUser, OrderLineRecord,
    OrderRecord, ProductRecord, Result, StoreError, UserRecord,
    store::{CartStore, CatalogStore, OrderStore, OrderTransaction, UserStore},
};

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";
const USER_EMAIL_CONSTRAINT: &str = "users_email_key";

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, image, category_id, stock, featured, is_active, created_at";
const USER_COLUMNS: &str =
    "id, name, email, role, phone, address, city, state, pincode, is_active, created_at";
const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_name, email, total_cents, status, \
     shipping_address, contact_phone, payment_method, payment_status, created_at";

/// Opens a bounded connection pool.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            image: row.try_get("image")?,
            category_id: row.try_get("category_id")?,
            stock: row.try_get("stock")?,
            featured: row.try_get("featured")?,
            active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_user(row: &PgRow) -> Result<UserRecord> {
        Ok(UserRecord {
            id: UserId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            pincode: row.try_get("pincode")?,
            active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order_header(row: &PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            order_number: row.try_get("order_number")?,
            user_id: row.try_get::<Option<i64>, _>("user_id")?.map(UserId::new),
            customer_name: row.try_get("customer_name")?,
            email: row.try_get("email")?,
            total: Money::from_cents(row.try_get("total_cents")?),
            status: row.try_get("status")?,
            shipping_address: row.try_get("shipping_address")?,
            contact_phone: row.try_get("contact_phone")?,
            payment_method: row.try_get("payment_method")?,
            payment_status: row.try_get("payment_status")?,
            created_at: row.try_get("created_at")?,
            lines: Vec::new(),
        })
    }

    fn row_to_order_line(row: &PgRow) -> Result<(OrderId, OrderLineRecord)> {
        let order_id = OrderId::new(row.try_get("order_id")?);
        Ok((
            order_id,
            OrderLineRecord {
                product_id: ProductId::new(row.try_get("product_id")?),
                product_name: row.try_get("product_name")?,
                quantity: to_quantity(row.try_get("quantity")?)?,
                unit_price: Money::from_cents(row.try_get("price_per_unit_cents")?),
                line_total: Money::from_cents(row.try_get("total_price_cents")?),
            },
        ))
    }

    /// Loads lines for the given headers and attaches them in place.
    async fn attach_lines(&self, orders: &mut [OrderRecord]) -> Result<()> {
        if orders.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();

        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, product_name, quantity, price_per_unit_cents, total_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &rows {
            let (order_id, line) = Self::row_to_order_line(row)?;
            if let Some(order) = orders.iter_mut().find(|o| o.id == order_id) {
                order.lines.push(line);
            }
        }
        Ok(())
    }
}

fn to_quantity(raw: i32) -> Result<u32> {
    u32::try_from(raw).map_err(|_| StoreError::Corrupt(format!("negative quantity {raw}")))
}

fn to_db_quantity(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| StoreError::InvalidWrite("quantity out of range"))
}

/// Maps constraint violations to their store-level meaning.
fn map_write_error(err: sqlx::Error, on_unique: impl FnOnce() -> StoreError) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation()
            && matches!(
                db_err.constraint(),
                Some(ORDER_NUMBER_CONSTRAINT) | Some(USER_EMAIL_CONSTRAINT)
            )
        {
            return on_unique();
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::ForeignKey(constraint);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn list_active_products(&self) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = TRUE ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, description, price_cents, image, category_id, stock, featured, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.image)
        .bind(product.category_id)
        .bind(product.stock)
        .bind(product.featured)
        .bind(product.active)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(&row)
    }
}

/// An open PostgreSQL transaction writing one order.
struct PostgresOrderTransaction {
    tx: Transaction<'static, Postgres>,
    order_id: Option<OrderId>,
}

#[async_trait]
impl OrderTransaction for PostgresOrderTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<InsertedOrder> {
        if self.order_id.is_some() {
            return Err(StoreError::InvalidWrite(
                "order header already inserted in this transaction",
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO orders (order_number, user_id, customer_name, email, total_cents, status,
                                shipping_address, contact_phone, payment_method, payment_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, created_at
            "#,
        )
        .bind(&order.order_number)
        .bind(order.user_id.map(|id| id.as_i64()))
        .bind(&order.customer_name)
        .bind(&order.email)
        .bind(order.total.cents())
        .bind(&order.status)
        .bind(&order.shipping_address)
        .bind(&order.contact_phone)
        .bind(&order.payment_method)
        .bind(&order.payment_status)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            map_write_error(e, || {
                StoreError::DuplicateOrderNumber(order.order_number.clone())
            })
        })?;

        let inserted = InsertedOrder {
            id: OrderId::new(row.try_get("id")?),
            created_at: row.try_get("created_at")?,
        };
        self.order_id = Some(inserted.id);
        Ok(inserted)
    }

    async fn insert_line(&mut self, line: &NewOrderLine) -> Result<()> {
        let order_id = self
            .order_id
            .ok_or_else(|| StoreError::ForeignKey("order header not inserted".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity,
                                     price_per_unit_cents, total_price_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order_id.as_i64())
        .bind(line.product_id.as_i64())
        .bind(&line.product_name)
        .bind(to_db_quantity(line.quantity)?)
        .bind(line.unit_price.cents())
        .bind(line.line_total.cents())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, || StoreError::InvalidWrite("duplicate order line")))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { tx, .. } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let Self { tx, order_id } = *self;
        tx.rollback().await?;
        tracing::debug!(order_id = ?order_id, "Order transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn begin_order(&self) -> Result<Box<dyn OrderTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresOrderTransaction { tx, order_id: None }))
    }

    async fn get_order(&self, order_number: &str) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut orders = vec![Self::row_to_order_header(&row)?];
        self.attach_lines(&mut orders).await?;
        Ok(orders.pop())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = rows
            .iter()
            .map(Self::row_to_order_header)
            .collect::<Result<Vec<_>>>()?;
        self.attach_lines(&mut orders).await?;
        Ok(orders)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, phone, address, city, state, pincode)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.city)
        .bind(&user.state)
        .bind(&user.pincode)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, || StoreError::DuplicateEmail(user.email.clone())))?;

        Self::row_to_user(&row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_credentials(&self, email: &str) -> Result<Option<(UserRecord, String)>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((Self::row_to_user(&row)?, row.try_get("password_hash")?))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLineRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT c.quantity, p.id, p.name, p.price_cents, p.image
            FROM cart_items c
            JOIN products p ON c.product_id = p.id
            WHERE c.user_id = $1
            ORDER BY c.added_at ASC, c.product_id ASC
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CartLineRecord {
                    product_id: ProductId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                    price: Money::from_cents(row.try_get("price_cents")?),
                    image: row.try_get("image")?,
                    quantity: to_quantity(row.try_get("quantity")?)?,
                })
            })
            .collect()
    }

    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
    ) -> Result<bool> {
        if quantity > max_quantity {
            return Ok(false);
        }

        // The conflict branch holds the row lock while the cap is evaluated
        let merged: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            WHERE cart_items.quantity + EXCLUDED.quantity <= $4
            RETURNING quantity
            "#,
        )
        .bind(user_id.as_i64())
        .bind(product_id.as_i64())
        .bind(to_db_quantity(quantity)?)
        .bind(to_db_quantity(max_quantity)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, || StoreError::InvalidWrite("duplicate cart line")))?;

        Ok(merged.is_some())
    }

    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $1 WHERE user_id = $2 AND product_id = $3",
        )
        .bind(to_db_quantity(quantity)?)
        .bind(user_id.as_i64())
        .bind(product_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_from_cart(&self, user_id: UserId, product_id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_i64())
            .bind(product_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
