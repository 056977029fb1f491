//! API handlers for the library REST endpoints

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{AuthorSummary, BookSummary, LoanedCopy, PageRequest, UserClaims},
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Login required".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = state.services.auth.decode_token(token)?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Raw form submission: a JSON object whose keys are field names.
///
/// Anything else is rejected as a validation error rather than axum's plain-text reply.
#[derive(Deserialize, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct FormPayload(pub Map<String, Value>);

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    PaginatedBooks = PaginatedResponse<BookSummary>,
    PaginatedAuthors = PaginatedResponse<AuthorSummary>,
    PaginatedLoans = PaginatedResponse<LoanedCopy>
)]
pub struct PaginatedResponse<T> {
    /// Rows of the requested page
    pub items: Vec<T>,
    /// Total number of rows
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub per_page: i64,
    /// Number of pages
    pub num_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            num_pages: page.num_pages(total),
        }
    }
}
