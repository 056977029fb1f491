//! Book instances (copies) repository

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BookCopy, BookInstance, LoanStatus, LoanedCopy, PageRequest},
};

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a copy by its unique id
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Copies of one book
    pub async fn for_book(&self, book_id: i32) -> AppResult<Vec<BookCopy>> {
        let rows = sqlx::query_as::<_, BookCopy>(
            r#"
            SELECT id, imprint, status, due_back
            FROM book_instances
            WHERE book_id = $1
            ORDER BY id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// On-loan copies, earliest due first; `borrower_id` restricts to one borrower
    pub async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedCopy>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::int IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, LoanedCopy>(
            r#"
            SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back,
                   bi.borrower_id, u.username AS borrower
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN users u ON u.id = bi.borrower_id
            WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back ASC NULLS LAST, bi.id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Single-row update of `due_back`
    pub async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "UPDATE book_instances SET due_back = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(due_back)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }
}
