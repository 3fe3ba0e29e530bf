//! Integration tests for order placement.
//!
//! These tests drive the full validate, price and write pipeline against the
//! in-memory store, including injected store failures.

use std::collections::HashSet;

use common::{Money, ProductId};
use domain::{
    Identity, OrderError, OrderService, OrderStatus, OrderSubmission, PaymentMethod, Role,
    SubmittedLine, Unavailability,
};
use store::{CatalogStore, InMemoryStore, NewProduct, NewUser, ProductRecord, UserStore};

fn submission(cart: Vec<SubmittedLine>) -> OrderSubmission {
    OrderSubmission {
        cart: Some(cart),
        shipping_address: Some("14 Park Avenue, Chennai".to_string()),
        contact_phone: Some("9840012345".to_string()),
        payment_method: Some("cash-on-delivery".to_string()),
        customer_name: Some("Lakshmi".to_string()),
        email: None,
    }
}

async fn product(store: &InMemoryStore, name: &str, cents: i64) -> ProductRecord {
    store
        .insert_product(NewProduct::new(name, Money::from_cents(cents)))
        .await
        .unwrap()
}

async fn customer(store: &InMemoryStore, email: &str) -> Identity {
    let user = store
        .create_user(NewUser {
            name: "Lakshmi".to_string(),
            email: email.to_string(),
            password_hash: "unused".to_string(),
            role: "customer".to_string(),
            phone: None,
            address: None,
            city: None,
            state: None,
            pincode: None,
        })
        .await
        .unwrap();
    Identity {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: Role::Customer,
    }
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn active_product_is_priced_from_catalog() {
        let store = InMemoryStore::new();
        let tee = product(&store, "Graphic Tee", 25_000).await;
        let service = OrderService::new(store.clone());

        let placed = service
            .place_order(None, submission(vec![SubmittedLine::new(tee.id.as_i64(), 2)]))
            .await
            .unwrap();

        assert_eq!(placed.total.to_string(), "500.00");
        assert_eq!(placed.lines.len(), 1);
        assert_eq!(placed.lines[0].quantity, 2);
        assert_eq!(placed.lines[0].unit_price.cents(), 25_000);
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.payment_method, PaymentMethod::CashOnDelivery);
        assert!(placed.user_id.is_none());

        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.order_line_count().await, 1);
    }

    #[tokio::test]
    async fn inactive_product_creates_no_rows() {
        let store = InMemoryStore::new();
        let active = product(&store, "Jeans", 120_000).await;
        let retired = store
            .insert_product(NewProduct::new("Old Jacket", Money::from_cents(90_000)).inactive())
            .await
            .unwrap();
        let service = OrderService::new(store.clone());

        let err = service
            .place_order(
                None,
                submission(vec![
                    SubmittedLine::new(active.id.as_i64(), 1),
                    SubmittedLine::new(retired.id.as_i64(), 1),
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::ProductUnavailable {
                product_id,
                reason: Unavailability::Inactive,
            } if product_id == retired.id
        ));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_line_count().await, 0);
    }

    #[tokio::test]
    async fn missing_product_creates_no_rows() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());

        let err = service
            .place_order(None, submission(vec![SubmittedLine::new(999, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::ProductUnavailable {
                reason: Unavailability::Missing,
                ..
            }
        ));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_store_access() {
        let store = InMemoryStore::new();
        // Any catalog read or order write now fails, so touching the store
        // would surface as a persistence error
        store.set_fail_on_catalog_read(true).await;
        store.set_fail_on_order_insert(true).await;
        let service = OrderService::new(store.clone());

        let err = service
            .place_order(None, submission(vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Validation(ref e) if e.field == "cart"));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn catalog_failure_during_pricing_writes_nothing() {
        let store = InMemoryStore::new();
        let shoes = product(&store, "Loafers", 60_000).await;
        store.set_fail_on_catalog_read(true).await;
        let service = OrderService::new(store.clone());

        let err = service
            .place_order(None, submission(vec![SubmittedLine::new(shoes.id.as_i64(), 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Persistence(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn failing_second_line_rolls_back_header_and_lines() {
        let store = InMemoryStore::new();
        let a = product(&store, "Sandals", 80_000).await;
        let b = product(&store, "Belt", 30_000).await;
        let c = product(&store, "Wallet", 45_000).await;
        store.set_fail_on_line(Some(1)).await;
        let service = OrderService::new(store.clone());

        let err = service
            .place_order(
                None,
                submission(vec![
                    SubmittedLine::new(a.id.as_i64(), 1),
                    SubmittedLine::new(b.id.as_i64(), 1),
                    SubmittedLine::new(c.id.as_i64(), 1),
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Persistence(_)));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_line_count().await, 0);
    }
}

mod properties {
    use super::*;

    #[tokio::test]
    async fn total_is_sum_of_catalog_line_totals() {
        let store = InMemoryStore::new();
        let a = product(&store, "Hoodie", 149_900).await;
        let b = product(&store, "Socks", 19_950).await;
        let service = OrderService::new(store.clone());

        let placed = service
            .place_order(
                None,
                submission(vec![
                    SubmittedLine::new(a.id.as_i64(), 1),
                    SubmittedLine::new(b.id.as_i64(), 3),
                ]),
            )
            .await
            .unwrap();

        let sum = placed
            .lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total))
            .unwrap();
        assert_eq!(placed.total, sum);
        assert_eq!(placed.total.cents(), 149_900 + 3 * 19_950);

        let stored = service
            .get_order(placed.order_number.as_str(), None)
            .await
            .unwrap();
        assert_eq!(stored.total, placed.total);
        assert_eq!(stored.lines, placed.lines);
    }

    #[tokio::test]
    async fn client_prices_are_ignored() {
        let store = InMemoryStore::new();
        let watch = product(&store, "Watch", 499_900).await;
        let service = OrderService::new(store);

        let json = format!(
            r#"{{
                "cart": [{{"product_id": {}, "quantity": 1, "price": 1, "price_per_unit": 1}}],
                "shipping_address": "Somewhere",
                "contact_phone": "9000000000",
                "payment_method": "online",
                "total_amount": 1
            }}"#,
            watch.id
        );
        let submission: OrderSubmission = serde_json::from_str(&json).unwrap();

        let placed = service.place_order(None, submission).await.unwrap();
        assert_eq!(placed.total.cents(), 499_900);
    }

    #[tokio::test]
    async fn identical_requests_create_distinct_orders() {
        let store = InMemoryStore::new();
        let bag = product(&store, "Bag", 60_000).await;
        let service = OrderService::new(store.clone());
        let request = submission(vec![SubmittedLine::new(bag.id.as_i64(), 1)]);

        let first = service.place_order(None, request.clone()).await.unwrap();
        let second = service.place_order(None, request).await.unwrap();

        assert_ne!(first.order_number, second.order_number);
        assert_eq!(store.order_count().await, 2);
    }

    #[tokio::test]
    async fn order_numbers_are_unique_across_many_orders() {
        let store = InMemoryStore::new();
        let pen = product(&store, "Pen", 1_000).await;
        let service = OrderService::new(store.clone());

        let mut numbers = HashSet::new();
        for _ in 0..200 {
            let placed = service
                .place_order(None, submission(vec![SubmittedLine::new(pen.id.as_i64(), 1)]))
                .await
                .unwrap();
            assert!(numbers.insert(placed.order_number));
        }
        assert_eq!(store.order_count().await, 200);
    }

    #[tokio::test]
    async fn concurrent_placements_all_commit() {
        let store = InMemoryStore::new();
        let mug = product(&store, "Mug", 35_000).await;
        let service = OrderService::new(store.clone());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let service = service.clone();
            let request = submission(vec![SubmittedLine::new(mug.id.as_i64(), 2)]);
            handles.push(tokio::spawn(async move {
                service.place_order(None, request).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.order_count().await, 20);
        assert_eq!(store.order_line_count().await, 20);
    }
}

mod visibility {
    use super::*;

    #[tokio::test]
    async fn owned_orders_are_private() {
        let store = InMemoryStore::new();
        let owner = customer(&store, "owner@example.com").await;
        let other = customer(&store, "other@example.com").await;
        let lamp = product(&store, "Lamp", 75_000).await;
        let service = OrderService::new(store);

        let placed = service
            .place_order(
                Some(&owner),
                submission(vec![SubmittedLine::new(lamp.id.as_i64(), 1)]),
            )
            .await
            .unwrap();
        assert_eq!(placed.user_id, Some(owner.user_id));

        let number = placed.order_number.as_str();
        assert!(service.get_order(number, Some(&owner)).await.is_ok());
        assert!(matches!(
            service.get_order(number, Some(&other)).await,
            Err(OrderError::NotFound(_))
        ));
        assert!(matches!(
            service.get_order(number, None).await,
            Err(OrderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn guest_orders_are_visible_by_number() {
        let store = InMemoryStore::new();
        let someone = customer(&store, "someone@example.com").await;
        let rug = product(&store, "Rug", 210_000).await;
        let service = OrderService::new(store);

        let placed = service
            .place_order(None, submission(vec![SubmittedLine::new(rug.id.as_i64(), 1)]))
            .await
            .unwrap();

        let number = placed.order_number.as_str();
        assert!(service.get_order(number, None).await.is_ok());
        assert!(service.get_order(number, Some(&someone)).await.is_ok());
        assert!(matches!(
            service.get_order("ORD-20200101-000000000000", None).await,
            Err(OrderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_order_numbers_are_not_found() {
        let store = InMemoryStore::new();
        let rug = product(&store, "Rug", 210_000).await;
        let service = OrderService::new(store);

        let placed = service
            .place_order(None, submission(vec![SubmittedLine::new(rug.id.as_i64(), 1)]))
            .await
            .unwrap();

        let lowercase = placed.order_number.as_str().to_lowercase();
        for number in [lowercase.as_str(), "ORD-1", "", "'; DROP TABLE orders; --"] {
            assert!(matches!(
                service.get_order(number, None).await,
                Err(OrderError::NotFound(ref n)) if n == number
            ));
        }
    }

    #[tokio::test]
    async fn list_orders_returns_only_own_orders_newest_first() {
        let store = InMemoryStore::new();
        let me = customer(&store, "me@example.com").await;
        let other = customer(&store, "them@example.com").await;
        let cup = product(&store, "Cup", 9_900).await;
        let service = OrderService::new(store);
        let request = || submission(vec![SubmittedLine::new(cup.id.as_i64(), 1)]);

        let first = service.place_order(Some(&me), request()).await.unwrap();
        let second = service.place_order(Some(&me), request()).await.unwrap();
        service.place_order(Some(&other), request()).await.unwrap();
        service.place_order(None, request()).await.unwrap();

        let mine = service.list_orders(&me).await.unwrap();
        let numbers: Vec<_> = mine.iter().map(|o| o.order_number.clone()).collect();
        assert_eq!(numbers, vec![second.order_number, first.order_number]);
    }

    #[tokio::test]
    async fn unknown_product_id_in_cart_never_reaches_writer() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());

        let err = service
            .place_order(
                None,
                submission(vec![SubmittedLine::new(ProductId::new(5).as_i64(), 1)]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.reason(), "product_unavailable");
        assert_eq!(store.order_count().await, 0);
    }
}
