//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, catalog, health, loans};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "1.0.0",
        description = "Library catalog, loans and administration REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Catalog
        catalog::home,
        catalog::list_books,
        catalog::get_book,
        catalog::list_authors,
        catalog::get_author,
        // Loans
        loans::my_books,
        loans::all_borrowed,
        loans::renewal_form,
        loans::renew_book,
        // Admin
        admin::author_create_form,
        admin::create_author,
        admin::author_update_form,
        admin::update_author,
        admin::delete_author,
        admin::book_create_form,
        admin::create_book,
        admin::book_update_form,
        admin::update_book,
        admin::delete_book,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::UserInfo,
            crate::models::Capability,
            // Catalog
            catalog::HomeResponse,
            crate::models::CatalogCounts,
            crate::models::Author,
            crate::models::author::AuthorRef,
            crate::models::AuthorSummary,
            crate::models::AuthorDetail,
            crate::models::Book,
            crate::models::BookSummary,
            crate::models::BookDetail,
            crate::models::Genre,
            crate::models::BookCopy,
            crate::models::LoanStatus,
            super::PaginatedBooks,
            super::PaginatedAuthors,
            // Loans
            crate::models::BookInstance,
            crate::models::BookInstanceView,
            crate::models::LoanedCopy,
            crate::models::RenewBookForm,
            crate::models::RenewalView,
            super::PaginatedLoans,
            // Forms
            crate::models::AuthorForm,
            crate::models::BookForm,
            crate::models::form::FormView,
            crate::models::form::Choice,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::FieldErrors,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Public catalog browsing"),
        (name = "loans", description = "Borrowed books and renewals"),
        (name = "admin", description = "Author and book administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
