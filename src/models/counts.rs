//! Aggregate catalog counts shown on the home page

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Live row counts of the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies whose status is "available"
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
}
