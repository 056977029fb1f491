//! Books repository

use sqlx::{Pool, Postgres, Transaction};

use super::map_write_error;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummaryRow, Book, BookFields, BookSummary, PageRequest,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// One page of books with their author names, and the total count
    pub async fn list(&self, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, BookSummaryRow>(
            r#"
            SELECT b.id, b.title, b.author_id,
                   a.first_name AS author_first_name,
                   a.last_name AS author_last_name
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            ORDER BY b.title, b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(BookSummary::from).collect(), total))
    }

    /// Books of one author, ordered by title
    pub async fn by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE author_id = $1 ORDER BY title, id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a book and its genre links in one transaction
    pub async fn create(&self, fields: &BookFields) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(fields.author_id)
        .bind(&fields.summary)
        .bind(&fields.isbn)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        Self::replace_genres(&mut tx, book.id, &fields.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Overwrite every editable field of a book, genres included
    pub async fn update(&self, id: i32, fields: &BookFields) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, summary = $4, isbn = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(fields.author_id)
        .bind(&fields.summary)
        .bind(&fields.isbn)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Self::replace_genres(&mut tx, book.id, &fields.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Delete a book; copies still referencing it make the store refuse
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn replace_genres(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO book_genres (book_id, genre_id)
            SELECT $1, UNNEST($2::int[])
            "#,
        )
        .bind(book_id)
        .bind(genre_ids)
        .execute(&mut **tx)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }
}
