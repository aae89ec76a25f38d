//! HTTP API Layer
//!
//! This crate exposes the ledger engine over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: thin adapters from HTTP to [`TransactionCoordinator`]
//! - **Middleware**: JWT authentication and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: `LedgerError` mapped to status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(coordinator, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use domain_ledger::TransactionCoordinator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{accounts, health, transactions};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: TransactionCoordinator,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `coordinator` - Ledger coordinator over the chosen storage
/// * `config` - API configuration
pub fn create_router(coordinator: TransactionCoordinator, config: ApiConfig) -> Router {
    let state = AppState {
        coordinator,
        config,
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let transaction_routes = Router::new()
        .route(
            "/",
            post(transactions::submit_transaction).get(transactions::list_transactions),
        )
        .route("/:id", get(transactions::get_transaction));

    let account_routes = Router::new()
        .route("/:id/balance", get(accounts::get_balance))
        .route("/:id/recompute", post(accounts::recompute_balance));

    // Protected API routes; audit runs inside auth so it sees the claims
    let api_routes = Router::new()
        .nest("/transactions", transaction_routes)
        .nest("/accounts", account_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
