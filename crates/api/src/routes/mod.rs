//! HTTP route handlers.

pub mod auth;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use axum::Json;
use serde::Serialize;

/// Success envelope: `{"status": "success", ...data}`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub status: &'static str,
    #[serde(flatten)]
    pub data: T,
}

/// Wraps `data` in the success envelope.
pub fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        data,
    })
}
