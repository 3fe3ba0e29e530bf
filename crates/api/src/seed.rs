//! Demo catalog for running without a database.

use common::Money;
use store::{CatalogStore, NewProduct};

/// Inserts a small catalog so the in-memory server has something to sell.
pub async fn seed_demo_catalog<C: CatalogStore>(store: &C) -> store::Result<()> {
    let products = [
        NewProduct::new("Classic White Tee", Money::from_units(499))
            .description("Organic cotton crew neck")
            .image("images/white-tee.jpg")
            .stock(120)
            .featured(),
        NewProduct::new("Slim Fit Denim", Money::from_units(1_899))
            .description("Stretch denim in indigo wash")
            .image("images/denim.jpg")
            .stock(60),
        NewProduct::new("Linen Kurta", Money::from_units(1_250))
            .description("Breathable linen, straight cut")
            .image("images/kurta.jpg")
            .stock(40)
            .featured(),
        NewProduct::new("Canvas Sneakers", Money::from_units(2_499))
            .image("images/sneakers.jpg")
            .stock(25),
        NewProduct::new("Leather Belt", Money::from_units(799))
            .image("images/belt.jpg")
            .stock(80),
        NewProduct::new("Silk Scarf", Money::from_units(950))
            .image("images/scarf.jpg")
            .inactive(),
    ];

    for product in products {
        store.insert_product(product).await?;
    }
    tracing::info!("Seeded demo catalog");
    Ok(())
}
