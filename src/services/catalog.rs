//! Catalog query service: counts, listings and detail views

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorRef, book_instance::is_overdue, AuthorDetail, AuthorSummary, BookDetail, BookSummary,
        Capability, CatalogCounts, LoanedCopy, PageRequest, UserClaims,
    },
    repository::CatalogStore,
};

use super::today;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Check the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    /// Live catalog counts
    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        self.store.counts().await
    }

    pub async fn list_books(&self, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)> {
        let (books, total) = self.store.list_books(page).await?;
        page.ensure_exists(total)?;
        tracing::debug!(page = page.page, total, "Listed books");
        Ok((books, total))
    }

    /// Book with author, genres and copies
    pub async fn book_detail(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.store.get_book(id).await?;

        let author = match book.author_id {
            Some(author_id) => match self.store.get_author(author_id).await {
                Ok(author) => Some(AuthorRef::from(&author)),
                Err(AppError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        let genres = self.store.book_genres(id).await?;
        tracing::debug!(book_id = id, genres = genres.len(), "Loaded book detail");
        let today = today();
        let copies = self
            .store
            .book_copies(id)
            .await?
            .into_iter()
            .map(|mut copy| {
                copy.is_overdue = is_overdue(copy.due_back, today);
                copy
            })
            .collect();

        Ok(BookDetail {
            book,
            author,
            genres,
            copies,
        })
    }

    pub async fn list_authors(&self, page: PageRequest) -> AppResult<(Vec<AuthorSummary>, i64)> {
        let (authors, total) = self.store.list_authors(page).await?;
        page.ensure_exists(total)?;
        Ok((authors.into_iter().map(AuthorSummary::from).collect(), total))
    }

    /// Author with their books
    pub async fn author_detail(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.store.get_author(id).await?;
        let books = self
            .store
            .author_books(id)
            .await?
            .iter()
            .map(|book| BookSummary::new(book, Some(&author)))
            .collect();

        Ok(AuthorDetail {
            name: author.display_name(),
            author,
            books,
        })
    }

    /// Copies on loan to the caller, earliest due first
    pub async fn my_loans(
        &self,
        claims: &UserClaims,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedCopy>, i64)> {
        self.loans(Some(claims.user_id), page).await
    }

    /// Every copy on loan, earliest due first
    pub async fn all_loans(
        &self,
        claims: &UserClaims,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedCopy>, i64)> {
        claims.require(Capability::CanMarkReturned)?;
        self.loans(None, page).await
    }

    async fn loans(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedCopy>, i64)> {
        let (copies, total) = self.store.list_loans(borrower_id, page).await?;
        page.ensure_exists(total)?;
        tracing::debug!(?borrower_id, page = page.page, total, "Listed loans");
        Ok((mark_overdue(copies, today()), total))
    }
}

fn mark_overdue(copies: Vec<LoanedCopy>, today: NaiveDate) -> Vec<LoanedCopy> {
    copies
        .into_iter()
        .map(|mut copy| {
            copy.is_overdue = is_overdue(copy.due_back, today);
            copy
        })
        .collect()
}
