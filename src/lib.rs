//! Local Library catalog server
//!
//! A REST JSON API over a small library catalog: books, authors, genres and
//! the physical copies patrons borrow, with loan renewal and capability-gated
//! administration of authors and books.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Catalog
        .route("/", get(api::catalog::home))
        .route("/books", get(api::catalog::list_books))
        .route("/books/:id", get(api::catalog::get_book))
        .route("/authors", get(api::catalog::list_authors))
        .route("/authors/:id", get(api::catalog::get_author))
        // Loans
        .route("/mybooks", get(api::loans::my_books))
        .route("/borrowed", get(api::loans::all_borrowed))
        .route(
            "/book/:id/renew",
            get(api::loans::renewal_form).post(api::loans::renew_book),
        )
        // Author administration
        .route(
            "/author/create",
            get(api::admin::author_create_form).post(api::admin::create_author),
        )
        .route(
            "/author/:id/update",
            get(api::admin::author_update_form).post(api::admin::update_author),
        )
        .route("/author/:id/delete", post(api::admin::delete_author))
        // Book administration
        .route(
            "/book/create",
            get(api::admin::book_create_form).post(api::admin::create_book),
        )
        .route(
            "/book/:id/update",
            get(api::admin::book_update_form).post(api::admin::update_book),
        )
        .route("/book/:id/delete", post(api::admin::delete_book))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
