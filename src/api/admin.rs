//! Author and book administration endpoints
//!
//! Every handler checks the entity's capability before anything else. Writes
//! answer with a 303 redirect; rejected submissions re-render the form.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::{form::FormView, AuthorForm, BookForm, UserClaims},
    services::admin::EntityDescriptor,
    AppState,
};

use super::{AuthenticatedUser, FormPayload};

/// Redirect to the written record, or re-render the form if validation failed
async fn after_write(
    state: &AppState,
    claims: &UserClaims,
    descriptor: EntityDescriptor,
    payload: Map<String, Value>,
    outcome: AppResult<i32>,
) -> AppResult<Response> {
    match outcome {
        Ok(id) => Ok(Redirect::to(&descriptor.detail_url(id)).into_response()),
        Err(AppError::Validation(errors)) => {
            let view = state
                .services
                .admin
                .rejected_form(claims, descriptor, payload, errors)
                .await?;
            Ok(Json(view).into_response())
        }
        Err(e) => Err(e),
    }
}

// Authors

/// Blank author form
#[utoipa::path(
    get,
    path = "/author/create",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Author form", body = FormView),
        (status = 403, description = "Missing catalog.author_edit", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_create_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FormView>> {
    EntityDescriptor::AUTHOR.guard(&claims)?;
    Ok(Json(state.services.admin.author_create_form(&claims)?))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/author/create",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Created; see the author detail"),
        (status = 200, description = "Rejected; form with errors", body = FormView),
        (status = 403, description = "Missing catalog.author_edit", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    FormPayload(payload): FormPayload,
) -> AppResult<Response> {
    EntityDescriptor::AUTHOR.guard(&claims)?;

    let outcome = state
        .services
        .admin
        .create_author(&claims, payload.clone())
        .await
        .map(|author| author.id);
    after_write(&state, &claims, EntityDescriptor::AUTHOR, payload, outcome).await
}

/// Author form filled with current values
#[utoipa::path(
    get,
    path = "/author/{id}/update",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author form", body = FormView),
        (status = 403, description = "Missing catalog.author_edit", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_update_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<FormView>> {
    EntityDescriptor::AUTHOR.guard(&claims)?;
    Ok(Json(state.services.admin.author_update_form(&claims, id).await?))
}

/// Update an author
#[utoipa::path(
    post,
    path = "/author/{id}/update",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Updated; see the author detail"),
        (status = 200, description = "Rejected; form with errors", body = FormView),
        (status = 403, description = "Missing catalog.author_edit", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    FormPayload(payload): FormPayload,
) -> AppResult<Response> {
    EntityDescriptor::AUTHOR.guard(&claims)?;

    let outcome = state
        .services
        .admin
        .update_author(&claims, id, payload.clone())
        .await
        .map(|author| author.id);
    after_write(&state, &claims, EntityDescriptor::AUTHOR, payload, outcome).await
}

/// Delete an author
#[utoipa::path(
    post,
    path = "/author/{id}/delete",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 303, description = "Deleted; see the author list"),
        (status = 403, description = "Missing catalog.author_edit", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Author still has books", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    EntityDescriptor::AUTHOR.guard(&claims)?;

    state.services.admin.delete_author(&claims, id).await?;
    Ok(Redirect::to(EntityDescriptor::AUTHOR.list_url))
}

// Books

/// Blank book form with author and genre choices
#[utoipa::path(
    get,
    path = "/book/create",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Book form", body = FormView),
        (status = 403, description = "Missing catalog.book_edit", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_create_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FormView>> {
    EntityDescriptor::BOOK.guard(&claims)?;
    Ok(Json(state.services.admin.book_create_form(&claims).await?))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/book/create",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Created; see the book detail"),
        (status = 200, description = "Rejected; form with errors", body = FormView),
        (status = 403, description = "Missing catalog.book_edit", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    FormPayload(payload): FormPayload,
) -> AppResult<Response> {
    EntityDescriptor::BOOK.guard(&claims)?;

    let outcome = state
        .services
        .admin
        .create_book(&claims, payload.clone())
        .await
        .map(|book| book.id);
    after_write(&state, &claims, EntityDescriptor::BOOK, payload, outcome).await
}

/// Book form filled with current values
#[utoipa::path(
    get,
    path = "/book/{id}/update",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book form", body = FormView),
        (status = 403, description = "Missing catalog.book_edit", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_update_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<FormView>> {
    EntityDescriptor::BOOK.guard(&claims)?;
    Ok(Json(state.services.admin.book_update_form(&claims, id).await?))
}

/// Update a book
#[utoipa::path(
    post,
    path = "/book/{id}/update",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookForm,
    responses(
        (status = 303, description = "Updated; see the book detail"),
        (status = 200, description = "Rejected; form with errors", body = FormView),
        (status = 403, description = "Missing catalog.book_edit", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    FormPayload(payload): FormPayload,
) -> AppResult<Response> {
    EntityDescriptor::BOOK.guard(&claims)?;

    let outcome = state
        .services
        .admin
        .update_book(&claims, id, payload.clone())
        .await
        .map(|book| book.id);
    after_write(&state, &claims, EntityDescriptor::BOOK, payload, outcome).await
}

/// Delete a book
#[utoipa::path(
    post,
    path = "/book/{id}/delete",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 303, description = "Deleted; see the book list"),
        (status = 403, description = "Missing catalog.book_edit", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book still has copies", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    EntityDescriptor::BOOK.guard(&claims)?;

    state.services.admin.delete_book(&claims, id).await?;
    Ok(Redirect::to(EntityDescriptor::BOOK.list_url))
}
