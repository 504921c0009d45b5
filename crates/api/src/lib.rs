//! HTTP API server with observability for the order service.
//!
//! Provides REST endpoints for the order lifecycle and cart management,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{CartStore, OrderStore};
use orders::{CartService, OrderService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + CartStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/order/create", post(routes::orders::create::<S>))
        .route(
            "/order/user/{user_id}",
            get(routes::orders::list_for_user::<S>),
        )
        .route(
            "/order/cancel/{order_number}/{user_id}",
            patch(routes::orders::cancel::<S>),
        )
        .route(
            "/order/{order_number}/status",
            put(routes::orders::update_status::<S>),
        )
        .route("/order/{order_number}", delete(routes::orders::delete::<S>))
        .route("/order/all", get(routes::orders::list_all::<S>))
        .route(
            "/order/sales/monthly",
            get(routes::orders::monthly_sales::<S>),
        )
        .route("/cart/add", post(routes::cart::add_item::<S>))
        .route("/cart/{user_id}", get(routes::cart::get_cart::<S>))
        .route("/cart/item/{id}", patch(routes::cart::update_item::<S>))
        .route("/cart/item/{id}", delete(routes::cart::remove_item::<S>))
        .route("/cart/clear/{user_id}", delete(routes::cart::clear::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the shared application state over the given store.
pub fn create_state<S: OrderStore + CartStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orders: OrderService::new(store.clone()),
        cart: CartService::new(store),
    })
}
