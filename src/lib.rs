//! Delivery Sync Server Library
//!
//! Keeps client profiles and delivery records in step with the managed
//! backend. This module exports the core types and the router builder for
//! testing and reuse.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

pub use config::{AllowedOrigin, Config, LogFormat, StoreBackend};
pub use db::{open_store, Db, Store, StoreError};
pub use error::{AppError, Result};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use services::{DeliveryGateway, ProfileSynchronizer};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub profiles: ProfileSynchronizer,
    pub deliveries: DeliveryGateway,
}

impl AppState {
    /// Create a new AppState around the given store
    pub fn new(db: Db) -> Self {
        Self {
            profiles: ProfileSynchronizer::new(db.clone()),
            deliveries: DeliveryGateway::new(db.clone()),
            db,
        }
    }
}

/// Build the application router.
///
/// CORS origin and request logging come from `config`, so every deployment
/// shares one set of handlers.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let origin = match &config.allowed_origin {
        AllowedOrigin::Any => AllowOrigin::any(),
        AllowedOrigin::Exact(value) => AllowOrigin::exact(value.clone()),
    };
    let allowed_headers = [
        AUTHORIZATION,
        CONTENT_TYPE,
        HeaderName::from_static("apikey"),
        HeaderName::from_static("x-client-info"),
    ];

    let sync_cors = CorsLayer::new()
        .allow_origin(origin.clone())
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers.clone());

    let deliveries_cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(allowed_headers);

    // Panics are caught inside the CORS layers so a 500 still carries CORS headers
    let sync_routes = Router::new()
        .route(
            "/api/sync-profile",
            post(routes::sync_profile).fallback(routes::method_not_allowed),
        )
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(sync_cors);

    let delivery_routes = Router::new()
        .route(
            "/api/deliveries",
            get(routes::list_deliveries).post(routes::create_delivery),
        )
        .route("/api/deliveries/batch", post(routes::create_deliveries))
        .route(
            "/api/deliveries/optimization",
            post(routes::optimize_deliveries),
        )
        .route("/api/deliveries/:id", delete(routes::delete_delivery))
        .route(
            "/api/deliveries/:id/status",
            patch(routes::update_delivery_status),
        )
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(deliveries_cors);

    let health_routes = Router::new()
        .route("/health", get(routes::health_check))
        .layer(CatchPanicLayer::custom(error::handle_panic));

    let mut app = Router::new()
        .merge(health_routes)
        .merge(sync_routes)
        .merge(delivery_routes)
        .with_state(state);

    if config.log_requests {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}
