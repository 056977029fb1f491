//! Genres repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::Genre};

#[derive(Clone)]
pub struct GenresRepository {
    pool: Pool<Postgres>,
}

impl GenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All genres ordered by name
    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Genres attached to a book
    pub async fn for_book(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.name, g.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
