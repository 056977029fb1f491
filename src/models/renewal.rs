//! Loan renewal form

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::book_instance::BookInstanceView;
use super::form::FormView;

/// Fields of the renewal form
pub const RENEWAL_FIELDS: &[&str] = &["renewal_date"];

/// Submitted renewal form
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema)]
pub struct RenewBookForm {
    /// Proposed due date: between today and four weeks from today
    pub renewal_date: Option<String>,
}

/// The renewal page: the copy being renewed and its form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalView {
    pub bookinst: BookInstanceView,
    pub form: FormView,
}
