//! Public catalog endpoints: home page, book and author listings

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{AuthorDetail, BookDetail, CatalogCounts, PageQuery, PageRequest},
    services::sessions::SessionId,
    AppState,
};

use super::{PaginatedAuthors, PaginatedBooks, PaginatedResponse};

/// Cookie carrying the session handle
pub const SESSION_COOKIE: &str = "sessionid";

/// Home page: catalog counts plus the caller's previous visit count
#[derive(Serialize, ToSchema)]
pub struct HomeResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits to this page earlier in the session
    pub num_visits: i64,
}

/// Resolve the caller's session, starting a new one when the cookie is missing or malformed
fn session(jar: CookieJar) -> (SessionId, CookieJar) {
    if let Some(session) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::parse(cookie.value()))
    {
        return (session, jar);
    }

    let session = SessionId::generate();
    let cookie = Cookie::build((SESSION_COOKIE, session.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (session, jar.add(cookie))
}

/// Catalog counts and session visit count
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page", body = HomeResponse)
    )
)]
pub async fn home(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<HomeResponse>)> {
    let (session, jar) = session(jar);
    let counts = state.services.catalog.counts().await?;
    let num_visits = state.services.visits.record_visit(&session).await?;

    Ok((jar, Json(HomeResponse { counts, num_visits })))
}

/// List books by title
#[utoipa::path(
    get,
    path = "/books",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = PaginatedBooks),
        (status = 404, description = "No such page", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedBooks>> {
    let page = PageRequest::new(query.page)?;
    let (books, total) = state.services.catalog.list_books(page).await?;
    Ok(Json(PaginatedResponse::new(books, total, page)))
}

/// Book with its author, genres and copies
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.book_detail(id).await?;
    Ok(Json(book))
}

/// List authors by name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = PaginatedAuthors),
        (status = 404, description = "No such page", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedAuthors>> {
    let page = PageRequest::new(query.page)?;
    let (authors, total) = state.services.catalog.list_authors(page).await?;
    Ok(Json(PaginatedResponse::new(authors, total, page)))
}

/// Author with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.author_detail(id).await?;
    Ok(Json(author))
}
