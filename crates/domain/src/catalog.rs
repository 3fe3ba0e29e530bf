//! Product catalog reads.

use common::ProductId;
use store::{CatalogStore, ProductRecord, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No active product has this id.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Read-only view of the active catalog.
#[derive(Clone)]
pub struct CatalogService<C> {
    store: C,
}

impl<C: CatalogStore> CatalogService<C> {
    pub fn new(store: C) -> Self {
        Self { store }
    }

    /// Lists active products, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        Ok(self.store.list_active_products().await?)
    }

    /// Returns an active product. Inactive products are reported as not found.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductRecord, CatalogError> {
        self.store
            .get_product(id)
            .await?
            .filter(|product| product.active)
            .ok_or(CatalogError::ProductNotFound(id))
    }
}
