//! Book (title) model and related types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::author::{Author, AuthorRef};
use super::book_instance::BookCopy;
use super::form::{self, INVALID_CHOICE, REQUIRED};
use super::genre::Genre;
use crate::error::{AppError, AppResult, FieldErrors};

/// Editable book fields, in form order
pub const BOOK_FIELDS: &[&str] = &["title", "author", "summary", "isbn", "genre"];

/// Book model from database (genres live in `book_genres`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
}

impl Book {
    /// Current values keyed by form field
    pub fn form_values(&self, genre_ids: &[i32]) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("title".into(), json!(self.title));
        values.insert("author".into(), json!(self.author_id));
        values.insert("summary".into(), json!(self.summary));
        values.insert("isbn".into(), json!(self.isbn));
        values.insert("genre".into(), json!(genre_ids));
        values
    }
}

/// Row of the book listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: Option<AuthorRef>,
}

/// Joined listing row (book + optional author names)
#[derive(Debug, Clone, FromRow)]
pub struct BookSummaryRow {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
}

impl From<BookSummaryRow> for BookSummary {
    fn from(row: BookSummaryRow) -> Self {
        let author = match (row.author_id, row.author_last_name, row.author_first_name) {
            (Some(id), Some(last), Some(first)) => Some(AuthorRef {
                id,
                name: format!("{}, {}", last, first),
            }),
            _ => None,
        };
        BookSummary {
            id: row.id,
            title: row.title,
            author,
        }
    }
}

impl BookSummary {
    pub fn new(book: &Book, author: Option<&Author>) -> Self {
        BookSummary {
            id: book.id,
            title: book.title.clone(),
            author: author.map(AuthorRef::from),
        }
    }
}

/// Book with its author, genres and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<AuthorRef>,
    pub genres: Vec<Genre>,
    pub copies: Vec<BookCopy>,
}

/// Submitted book form, before cleaning
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(
        required(message = "This field is required."),
        length(max = 200, message = "Ensure this value has at most 200 characters.")
    )]
    pub title: Option<String>,
    /// Author id (may be empty)
    pub author: Option<i32>,
    #[validate(
        required(message = "This field is required."),
        length(max = 1000, message = "Ensure this value has at most 1000 characters.")
    )]
    pub summary: Option<String>,
    #[validate(
        required(message = "This field is required."),
        length(max = 13, message = "Ensure this value has at most 13 characters.")
    )]
    pub isbn: Option<String>,
    /// Genre ids
    pub genre: Option<Vec<i32>>,
}

/// Cleaned book fields, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    /// Validate every field against the available author and genre choices
    pub fn clean(self, authors: &[Author], genres: &[Genre]) -> AppResult<BookFields> {
        let data = BookForm {
            title: form::non_blank(self.title),
            author: self.author,
            summary: form::non_blank(self.summary),
            isbn: form::non_blank(self.isbn),
            genre: self.genre,
        };

        let mut errors = match data.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if let Some(author_id) = data.author {
            if !authors.iter().any(|a| a.id == author_id) {
                errors.add("author", INVALID_CHOICE);
            }
        }

        let mut genre_ids = data.genre.unwrap_or_default();
        genre_ids.sort_unstable();
        genre_ids.dedup();
        if genre_ids.is_empty() {
            errors.add("genre", REQUIRED);
        } else if genre_ids.iter().any(|id| !genres.iter().any(|g| g.id == *id)) {
            errors.add("genre", INVALID_CHOICE);
        }

        errors.into_result()?;

        match (data.title, data.summary, data.isbn) {
            (Some(title), Some(summary), Some(isbn)) => Ok(BookFields {
                title,
                author_id: data.author,
                summary,
                isbn,
                genre_ids,
            }),
            _ => Err(AppError::Validation(FieldErrors::single("__all__", REQUIRED))),
        }
    }
}
