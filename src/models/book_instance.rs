//! Book instance (physical, loan-tracked copy) model and related types

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

/// Loan status of a copy, stored as a one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    /// Database code
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(format!("Invalid loan status code: {}", other)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Book instance model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    /// Unique id of this copy across the whole library
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    /// A copy is overdue once its due date has passed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }

    /// On-loan copies have a borrower, every other copy has none
    pub fn borrower_consistent(&self) -> bool {
        (self.status == LoanStatus::OnLoan) == self.borrower_id.is_some()
    }
}

pub(crate) fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.map(|d| d < today).unwrap_or(false)
}

/// Copy row shown on a book's detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: Uuid,
    pub imprint: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    #[sqlx(default)]
    #[serde(default)]
    pub is_overdue: bool,
}

/// On-loan copy shown in the borrowed-books listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanedCopy {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    /// Borrower's username
    pub borrower: Option<String>,
    #[sqlx(default)]
    #[serde(default)]
    pub is_overdue: bool,
}

/// Instance with its book title, shown on the renewal form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookInstanceView {
    #[serde(flatten)]
    pub instance: BookInstance,
    pub book_title: String,
    pub is_overdue: bool,
}

impl BookInstanceView {
    /// "<uuid> (<book title>)"
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.instance.id, self.book_title)
    }
}
