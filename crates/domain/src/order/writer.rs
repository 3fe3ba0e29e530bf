//! Atomic persistence of an order header and its lines.

use chrono::Utc;
use common::UserId;
use store::{NewOrder, NewOrderLine, OrderStore, OrderTransaction, StoreError};

use super::{
    OrderError, OrderNumberGenerator, OrderStatus, PaymentStatus, PlacedLine, PlacedOrder,
    PricedCart, ValidatedOrder, random_order_numbers,
};

/// Writes orders in a single store transaction.
///
/// Any failure after the transaction opens triggers an explicit rollback,
/// so the store is left exactly as it was.
#[derive(Clone)]
pub struct OrderWriter<S> {
    store: S,
    generate_number: OrderNumberGenerator,
}

impl<S: OrderStore> OrderWriter<S> {
    pub fn new(store: S) -> Self {
        Self::with_number_generator(store, random_order_numbers())
    }

    /// Creates a writer drawing order numbers from `generate_number`.
    pub fn with_number_generator(store: S, generate_number: OrderNumberGenerator) -> Self {
        Self {
            store,
            generate_number,
        }
    }

    /// Persists `order` priced as `priced`, owned by `user_id` if present.
    #[tracing::instrument(skip(self, order, priced), fields(order_number = tracing::field::Empty))]
    pub async fn write(
        &self,
        user_id: Option<UserId>,
        order: &ValidatedOrder,
        priced: PricedCart,
    ) -> Result<PlacedOrder, OrderError> {
        let order_number = (self.generate_number)(Utc::now());
        tracing::Span::current().record("order_number", order_number.as_str());

        let header = NewOrder {
            order_number: order_number.to_string(),
            user_id,
            customer_name: order.shipping.customer_name.clone(),
            email: order
                .shipping
                .email
                .as_ref()
                .map(|email| email.as_str().to_string()),
            total: priced.total,
            status: OrderStatus::Pending.as_str().to_string(),
            shipping_address: order.shipping.address.clone(),
            contact_phone: order.shipping.phone.clone(),
            payment_method: order.payment_method.as_str().to_string(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
        };
        let lines: Vec<NewOrderLine> = priced
            .lines
            .iter()
            .map(|line| NewOrderLine {
                product_id: line.product_id,
                product_name: line.name.clone(),
                quantity: line.quantity.get(),
                unit_price: line.unit_price,
                line_total: line.line_total,
            })
            .collect();

        let mut tx = self.store.begin_order().await?;
        let created_at = match write_rows(&mut tx, &header, &lines).await {
            Ok(created_at) => created_at,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                return Err(e.into());
            }
        };
        tx.commit().await?;

        tracing::info!(total = %priced.total, lines = lines.len(), "Order committed");

        Ok(PlacedOrder {
            order_number,
            user_id,
            created_at,
            total: priced.total,
            status: OrderStatus::Pending,
            payment_method: order.payment_method,
            payment_status: PaymentStatus::Pending,
            lines: priced
                .lines
                .into_iter()
                .map(|line| PlacedLine {
                    product_id: line.product_id,
                    name: line.name,
                    unit_price: line.unit_price,
                    quantity: line.quantity.get(),
                    line_total: line.line_total,
                })
                .collect(),
        })
    }
}

async fn write_rows(
    tx: &mut Box<dyn OrderTransaction>,
    header: &NewOrder,
    lines: &[NewOrderLine],
) -> Result<chrono::DateTime<Utc>, StoreError> {
    let inserted = tx.insert_order(header).await?;
    for line in lines {
        tx.insert_line(line).await?;
    }
    Ok(inserted.created_at)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use common::Money;
    use store::{CatalogStore, InMemoryStore, NewProduct};

    use super::*;
    use crate::order::{OrderNumber, OrderSubmission, PricingResolver, SubmittedLine};

    async fn priced_order(store: &InMemoryStore, count: i64) -> (ValidatedOrder, PricedCart) {
        let mut cart = Vec::new();
        for i in 0..count {
            let product = store
                .insert_product(NewProduct::new(
                    format!("Item {i}"),
                    Money::from_cents(1_000 * (i + 1)),
                ))
                .await
                .unwrap();
            cart.push(SubmittedLine::new(product.id.as_i64(), 1));
        }
        let order = OrderSubmission {
            cart: Some(cart),
            shipping_address: Some("7 Residency Road".to_string()),
            contact_phone: Some("9123456789".to_string()),
            payment_method: Some("online".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let priced = PricingResolver::new(store.clone())
            .resolve(&order.lines)
            .await
            .unwrap();
        (order, priced)
    }

    #[tokio::test]
    async fn writes_header_and_lines() {
        let store = InMemoryStore::new();
        let (order, priced) = priced_order(&store, 3).await;

        let placed = OrderWriter::new(store.clone())
            .write(None, &order, priced)
            .await
            .unwrap();

        assert_eq!(placed.total.cents(), 6_000);
        assert_eq!(placed.lines.len(), 3);
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.order_line_count().await, 3);

        let stored = store
            .get_order(placed.order_number.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total, placed.total);
        assert_eq!(stored.payment_method, "online");
    }

    #[tokio::test]
    async fn failed_line_rolls_back_header() {
        let store = InMemoryStore::new();
        let (order, priced) = priced_order(&store, 3).await;
        store.set_fail_on_line(Some(1)).await;

        let err = OrderWriter::new(store.clone())
            .write(None, &order, priced)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Persistence(_)));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_line_count().await, 0);
    }

    #[tokio::test]
    async fn failed_commit_persists_nothing() {
        let store = InMemoryStore::new();
        let (order, priced) = priced_order(&store, 1).await;
        store.set_fail_on_commit(true).await;

        let result = OrderWriter::new(store.clone())
            .write(None, &order, priced)
            .await;

        assert!(result.is_err());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn colliding_order_number_is_a_persistence_error() {
        let store = InMemoryStore::new();
        let (order, priced) = priced_order(&store, 1).await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let writer = OrderWriter::with_number_generator(
            store.clone(),
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                OrderNumber::from_string("ORD-20260101-000000000000")
            }),
        );

        writer.write(None, &order, priced.clone()).await.unwrap();
        let err = writer.write(None, &order, priced).await.unwrap_err();

        assert!(matches!(
            err,
            OrderError::Persistence(StoreError::DuplicateOrderNumber(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.order_line_count().await, 1);
    }
}
