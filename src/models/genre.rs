//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::form::Choice;

/// Book genre (e.g. Science Fiction, French Poetry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl From<&Genre> for Choice {
    fn from(genre: &Genre) -> Self {
        Choice {
            value: genre.id,
            label: genre.name.clone(),
        }
    }
}
