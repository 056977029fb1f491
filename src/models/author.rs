//! Author model and related types

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookSummary;
use super::form::{self, Choice, REQUIRED};
use crate::error::{AppError, AppResult, FieldErrors};

/// Editable author fields, in form order
pub const AUTHOR_FIELDS: &[&str] = &["first_name", "last_name", "date_of_birth", "date_of_death"];

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "last, first"
    pub fn display_name(&self) -> String {
        self.to_string()
    }

    /// Current values keyed by form field
    pub fn form_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("first_name".into(), json!(self.first_name));
        values.insert("last_name".into(), json!(self.last_name));
        values.insert("date_of_birth".into(), json!(self.date_of_birth));
        values.insert("date_of_death".into(), json!(self.date_of_death));
        values
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

impl From<&Author> for Choice {
    fn from(author: &Author) -> Self {
        Choice {
            value: author.id,
            label: author.display_name(),
        }
    }
}

/// Author reference embedded in book views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthorRef {
    pub id: i32,
    pub name: String,
}

impl From<&Author> for AuthorRef {
    fn from(author: &Author) -> Self {
        AuthorRef {
            id: author.id,
            name: author.display_name(),
        }
    }
}

/// Author row of the author listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorSummary {
    pub id: i32,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
}

impl From<Author> for AuthorSummary {
    fn from(author: Author) -> Self {
        AuthorSummary {
            id: author.id,
            name: author.display_name(),
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
        }
    }
}

/// Author with their books
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub author: Author,
    pub name: String,
    pub books: Vec<BookSummary>,
}

/// Submitted author form, before cleaning
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[validate(
        required(message = "This field is required."),
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "This field is required."),
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub date_of_death: Option<String>,
}

/// Cleaned author fields, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorFields {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Validate every field, collecting all errors at once
    pub fn clean(self) -> AppResult<AuthorFields> {
        let data = AuthorForm {
            first_name: form::non_blank(self.first_name),
            last_name: form::non_blank(self.last_name),
            date_of_birth: form::non_blank(self.date_of_birth),
            date_of_death: form::non_blank(self.date_of_death),
        };

        let mut errors = match data.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let date_of_birth =
            form::clean_required_date(&mut errors, "date_of_birth", data.date_of_birth.as_deref());
        let date_of_death =
            form::clean_optional_date(&mut errors, "date_of_death", data.date_of_death.as_deref());

        errors.into_result()?;

        match (data.first_name, data.last_name, date_of_birth) {
            (Some(first_name), Some(last_name), Some(date_of_birth)) => Ok(AuthorFields {
                first_name,
                last_name,
                date_of_birth,
                date_of_death,
            }),
            _ => Err(AppError::Validation(FieldErrors::single("__all__", REQUIRED))),
        }
    }
}
