//! Authors repository

use sqlx::{Pool, Postgres};

use super::map_write_error;
use crate::{
    error::{AppError, AppResult},
    models::{Author, AuthorFields, PageRequest},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// One page of authors, with the total count
    pub async fn list(&self, page: PageRequest) -> AppResult<(Vec<Author>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY last_name, first_name, id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Every author, in listing order
    pub async fn all(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY last_name, first_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, fields: &AuthorFields) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(fields.date_of_birth)
        .bind(fields.date_of_death)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    pub async fn update(&self, id: i32, fields: &AuthorFields) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $2, last_name = $3, date_of_birth = $4, date_of_death = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(fields.date_of_birth)
        .bind(fields.date_of_death)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Delete an author; books still referencing it make the store refuse
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        Ok(())
    }
}
