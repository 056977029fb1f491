//! Borrowed-book listings and loan renewal endpoints

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        form, renewal::RENEWAL_FIELDS, Capability, PageQuery, PageRequest, RenewBookForm,
        RenewalView,
    },
    AppState,
};

use super::{AuthenticatedUser, FormPayload, PaginatedLoans, PaginatedResponse};

/// Where a successful renewal sends the librarian
pub const BORROWED_URL: &str = "/api/v1/borrowed";

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "My borrowed copies, earliest due first", body = PaginatedLoans),
        (status = 401, description = "Login required", body = crate::error::ErrorResponse),
        (status = 404, description = "No such page", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedLoans>> {
    let page = PageRequest::new(query.page)?;
    let (copies, total) = state.services.catalog.my_loans(&claims, page).await?;
    Ok(Json(PaginatedResponse::new(copies, total, page)))
}

/// Every copy currently on loan
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All borrowed copies, earliest due first", body = PaginatedLoans),
        (status = 401, description = "Login required", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing catalog.can_mark_returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedLoans>> {
    claims.require(Capability::CanMarkReturned)?;

    let page = PageRequest::new(query.page)?;
    let (copies, total) = state.services.catalog.all_loans(&claims, page).await?;
    Ok(Json(PaginatedResponse::new(copies, total, page)))
}

/// Renewal form for one copy
#[utoipa::path(
    get,
    path = "/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewalView),
        (status = 403, description = "Missing catalog.can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn renewal_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalView>> {
    claims.require(Capability::CanMarkReturned)?;

    let view = state.services.loans.renewal_form(&claims, id).await?;
    Ok(Json(view))
}

/// Submit a new due date
///
/// Redirects to the borrowed listing on success. A rejected date re-renders
/// the form with its errors.
#[utoipa::path(
    post,
    path = "/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewBookForm,
    responses(
        (status = 303, description = "Renewed; see the borrowed listing"),
        (status = 200, description = "Rejected; form with errors", body = RenewalView),
        (status = 403, description = "Missing catalog.can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    FormPayload(payload): FormPayload,
) -> AppResult<Response> {
    claims.require(Capability::CanMarkReturned)?;

    let outcome = match form::bind::<RenewBookForm>(RENEWAL_FIELDS, payload.clone()) {
        Ok(submitted) => state.services.loans.renew(&claims, id, submitted).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(_) => Ok(Redirect::to(BORROWED_URL).into_response()),
        Err(AppError::Validation(errors)) => {
            let view = state
                .services
                .loans
                .rejected_form(&claims, id, payload, errors)
                .await?;
            Ok(Json(view).into_response())
        }
        Err(e) => Err(e),
    }
}
