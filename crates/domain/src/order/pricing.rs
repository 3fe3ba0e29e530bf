//! Server-side pricing against the catalog of record.

use common::{Money, ProductId};
use store::CatalogStore;

use super::{CartLine, OrderError, Quantity, Unavailability};
use crate::error::ValidationError;

/// A cart line with its authoritative price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub product_id: ProductId,
    /// Product name at order time.
    pub name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
    pub line_total: Money,
}

/// Every line of a cart, priced, with the order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
    pub lines: Vec<ResolvedLine>,
    pub total: Money,
}

/// Re-derives prices and availability for each cart line.
#[derive(Clone)]
pub struct PricingResolver<C> {
    catalog: C,
}

impl<C: CatalogStore> PricingResolver<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Prices every line, failing the whole cart if any product is missing
    /// or inactive.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn resolve(&self, lines: &[CartLine]) -> Result<PricedCart, OrderError> {
        let mut resolved = Vec::with_capacity(lines.len());
        let mut total = Money::zero();

        for line in lines {
            let product = match self.catalog.get_product(line.product_id).await? {
                Some(product) if product.active => product,
                Some(_) => {
                    return Err(OrderError::ProductUnavailable {
                        product_id: line.product_id,
                        reason: Unavailability::Inactive,
                    });
                }
                None => {
                    return Err(OrderError::ProductUnavailable {
                        product_id: line.product_id,
                        reason: Unavailability::Missing,
                    });
                }
            };

            let too_large = || ValidationError::new("cart", "order total is too large");
            let line_total = product
                .price
                .checked_multiply(line.quantity.get())
                .ok_or_else(too_large)?;
            total = total.checked_add(line_total).ok_or_else(too_large)?;

            resolved.push(ResolvedLine {
                product_id: product.id,
                name: product.name,
                unit_price: product.price,
                quantity: line.quantity,
                line_total,
            });
        }

        Ok(PricedCart {
            lines: resolved,
            total,
        })
    }
}
