//! Persisted per-user carts.

use common::{Money, ProductId};
use serde::Serialize;
use store::{CartLineRecord, Store, StoreError};
use thiserror::Error;

use crate::error::ValidationError;
use crate::identity::Identity;
use crate::order::Quantity;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The product is missing or inactive.
    #[error("Product {0} is not available")]
    ProductUnavailable(ProductId),

    /// The cart has no line for this product.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A user's cart with its subtotal at current catalog prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineRecord>,
    pub subtotal: Money,
}

/// Cart operations for authenticated users.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: Store> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id.as_i64()))]
    pub async fn view(&self, identity: &Identity) -> Result<CartView, CartError> {
        let lines = self.store.cart_lines(identity.user_id).await?;
        let subtotal = lines
            .iter()
            .map(|line| line.price.checked_multiply(line.quantity))
            .try_fold(Money::zero(), |acc, line_total| acc.checked_add(line_total?))
            .ok_or_else(|| ValidationError::new("cart", "cart total is too large"))?;
        Ok(CartView { lines, subtotal })
    }

    /// Adds `quantity` (default 1) of a product, merging with an existing line.
    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id.as_i64()))]
    pub async fn add(
        &self,
        identity: &Identity,
        product_id: Option<i64>,
        quantity: Option<i64>,
    ) -> Result<(), CartError> {
        let product_id = parse_product_id(product_id)?;
        let quantity = parse_quantity(quantity.unwrap_or(1))?;

        match self.store.get_product(product_id).await? {
            Some(product) if product.active => {}
            _ => return Err(CartError::ProductUnavailable(product_id)),
        }

        let added = self
            .store
            .add_to_cart(identity.user_id, product_id, quantity.get(), Quantity::MAX)
            .await?;
        if !added {
            return Err(quantity_error().into());
        }
        Ok(())
    }

    /// Replaces the quantity of an existing line.
    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id.as_i64()))]
    pub async fn update(
        &self,
        identity: &Identity,
        product_id: Option<i64>,
        quantity: Option<i64>,
    ) -> Result<(), CartError> {
        let product_id = parse_product_id(product_id)?;
        let quantity = match quantity {
            Some(raw) => parse_quantity(raw)?,
            None => return Err(ValidationError::required("quantity").into()),
        };

        if self
            .store
            .set_cart_quantity(identity.user_id, product_id, quantity.get())
            .await?
        {
            Ok(())
        } else {
            Err(CartError::NotInCart(product_id))
        }
    }

    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id.as_i64()))]
    pub async fn remove(&self, identity: &Identity, product_id: ProductId) -> Result<(), CartError> {
        if self
            .store
            .remove_from_cart(identity.user_id, product_id)
            .await?
        {
            Ok(())
        } else {
            Err(CartError::NotInCart(product_id))
        }
    }
}

fn parse_product_id(raw: Option<i64>) -> Result<ProductId, ValidationError> {
    match raw {
        Some(id) if id > 0 => Ok(ProductId::new(id)),
        Some(_) => Err(ValidationError::new("product_id", "must be a positive integer")),
        None => Err(ValidationError::required("product_id")),
    }
}

fn parse_quantity(raw: i64) -> Result<Quantity, ValidationError> {
    Quantity::new(raw).ok_or_else(quantity_error)
}

fn quantity_error() -> ValidationError {
    ValidationError::new(
        "quantity",
        format!("must be between 1 and {}", Quantity::MAX),
    )
}

#[cfg(test)]
mod tests {
    use store::{CatalogStore, InMemoryStore, NewProduct, NewUser, UserStore};

    use super::*;
    use crate::identity::Role;

    async fn setup() -> (InMemoryStore, Identity, ProductId) {
        let store = InMemoryStore::new();
        let user = store
            .create_user(NewUser {
                name: "Kiran".to_string(),
                email: "kiran@example.com".to_string(),
                password_hash: "x".to_string(),
                role: "customer".to_string(),
                phone: None,
                address: None,
                city: None,
                state: None,
                pincode: None,
            })
            .await
            .unwrap();
        let product = store
            .insert_product(NewProduct::new("Scarf", Money::from_cents(29_900)))
            .await
            .unwrap();
        let identity = Identity {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: Role::Customer,
        };
        (store, identity, product.id)
    }

    #[tokio::test]
    async fn add_defaults_to_one_and_accumulates() {
        let (store, identity, product_id) = setup().await;
        let service = CartService::new(store);

        service
            .add(&identity, Some(product_id.as_i64()), None)
            .await
            .unwrap();
        service
            .add(&identity, Some(product_id.as_i64()), Some(2))
            .await
            .unwrap();

        let view = service.view(&identity).await.unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 3);
        assert_eq!(view.subtotal.cents(), 89_700);
    }

    #[tokio::test]
    async fn add_rejects_inactive_product_and_overflowing_quantity() {
        let (store, identity, product_id) = setup().await;
        store.set_product_active(product_id, false).await;
        let service = CartService::new(store.clone());

        let err = service
            .add(&identity, Some(product_id.as_i64()), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ProductUnavailable(id) if id == product_id));

        store.set_product_active(product_id, true).await;
        service
            .add(&identity, Some(product_id.as_i64()), Some(9_999))
            .await
            .unwrap();
        let err = service
            .add(&identity, Some(product_id.as_i64()), Some(2))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(ref e) if e.field == "quantity"));
    }

    #[tokio::test]
    async fn concurrent_adds_never_exceed_line_cap() {
        let (store, identity, product_id) = setup().await;
        let service = CartService::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let identity = identity.clone();
                tokio::spawn(async move {
                    service
                        .add(&identity, Some(product_id.as_i64()), Some(2_000))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(CartError::Validation(e)) => assert_eq!(e.field, "quantity"),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 5);
        let view = service.view(&identity).await.unwrap();
        assert_eq!(view.lines[0].quantity, Quantity::MAX);
    }

    #[tokio::test]
    async fn update_and_remove_require_existing_line() {
        let (store, identity, product_id) = setup().await;
        let service = CartService::new(store);

        let err = service
            .update(&identity, Some(product_id.as_i64()), Some(4))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotInCart(_)));

        service
            .add(&identity, Some(product_id.as_i64()), Some(1))
            .await
            .unwrap();
        service
            .update(&identity, Some(product_id.as_i64()), Some(4))
            .await
            .unwrap();
        assert_eq!(service.view(&identity).await.unwrap().lines[0].quantity, 4);

        let err = service
            .update(&identity, Some(product_id.as_i64()), Some(0))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));

        service.remove(&identity, product_id).await.unwrap();
        assert!(matches!(
            service.remove(&identity, product_id).await,
            Err(CartError::NotInCart(_))
        ));
        assert!(service.view(&identity).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn missing_product_id_is_validation_error() {
        let (store, identity, _) = setup().await;
        let service = CartService::new(store);
        let err = service.add(&identity, None, Some(1)).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(ref e) if e.field == "product_id"));
    }
}
