//! HTTP API server for the Trendify storefront.
//!
//! Provides REST endpoints for the catalog, accounts, carts and checkout,
//! with cookie sessions, structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod session;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use domain::{AuthService, CartService, CatalogService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub catalog: CatalogService<S>,
    pub auth: AuthService<S>,
    pub cart: CartService<S>,
    pub orders: OrderService<S>,
    pub require_login_for_checkout: bool,
}

impl<S: Store> AppState<S> {
    /// Creates every service over the same store.
    pub fn new(store: S, require_login_for_checkout: bool) -> Self {
        Self::with_order_service(
            store.clone(),
            OrderService::new(store),
            require_login_for_checkout,
        )
    }

    /// Creates the state around a preconfigured order service.
    pub fn with_order_service(
        store: S,
        orders: OrderService<S>,
        require_login_for_checkout: bool,
    ) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            auth: AuthService::new(store.clone()),
            cart: CartService::new(store),
            orders,
            require_login_for_checkout,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, T>(
    state: Arc<AppState<S>>,
    sessions: T,
    secure_cookies: bool,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: Store,
    T: SessionStore + Clone,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/auth/register", post(routes::auth::register::<S>))
        .route("/auth/login", post(routes::auth::login::<S>))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/cart",
            get(routes::cart::view::<S>)
                .post(routes::cart::add::<S>)
                .put(routes::cart::update::<S>),
        )
        .route("/cart/{product_id}", delete(routes::cart::remove::<S>))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{order_number}", get(routes::orders::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(session::session_layer(sessions, secure_cookies))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
