//! Loan renewal workflow

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{
        form::{self, FormView},
        renewal::RENEWAL_FIELDS,
        BookInstance, BookInstanceView, Capability, RenewBookForm, RenewalView, UserClaims,
    },
    repository::CatalogStore,
};

use super::today;

/// Suggested loan extension
pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;
/// Latest acceptable due date, counted from today
pub const MAX_RENEWAL_WEEKS: i64 = 4;

pub const RENEWAL_IN_PAST: &str = "invalid date - renewal in past";
pub const RENEWAL_TOO_FAR: &str = "invalid date - more than 4 weeks ahead";

const RENEWAL_DATE: &str = "renewal_date";

/// Initial value offered by the renewal form
pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

/// Check a parsed renewal date against the allowed window `[today, today + 4 weeks]`
pub fn validate_renewal_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    if date < today {
        return Err(RENEWAL_IN_PAST);
    }
    if date > today + Duration::weeks(MAX_RENEWAL_WEEKS) {
        return Err(RENEWAL_TOO_FAR);
    }
    Ok(date)
}

impl RenewBookForm {
    /// Clean the submitted date; every failure lands on `renewal_date`
    pub fn clean(self, today: NaiveDate) -> AppResult<NaiveDate> {
        let mut errors = FieldErrors::new();
        let raw = form::non_blank(self.renewal_date);

        let Some(date) = form::clean_required_date(&mut errors, RENEWAL_DATE, raw.as_deref()) else {
            return Err(AppError::Validation(errors));
        };

        validate_renewal_date(date, today)
            .map_err(|message| AppError::Validation(FieldErrors::single(RENEWAL_DATE, message)))
    }
}

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn CatalogStore>,
}

impl LoansService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// The renewal page with a proposed date three weeks out
    pub async fn renewal_form(&self, claims: &UserClaims, id: Uuid) -> AppResult<RenewalView> {
        claims.require(Capability::CanMarkReturned)?;
        let today = today();

        let mut values = Map::new();
        values.insert(
            RENEWAL_DATE.to_string(),
            Value::String(proposed_renewal_date(today).to_string()),
        );
        self.view(id, today, values, FieldErrors::new()).await
    }

    /// The renewal page re-rendered with a rejected submission and its errors
    pub async fn rejected_form(
        &self,
        claims: &UserClaims,
        id: Uuid,
        submitted: Map<String, Value>,
        errors: FieldErrors,
    ) -> AppResult<RenewalView> {
        claims.require(Capability::CanMarkReturned)?;
        let values = form::whitelist(RENEWAL_FIELDS, submitted);
        self.view(id, today(), values, errors).await
    }

    /// Validate and store a new due date; only `due_back` changes
    pub async fn renew(
        &self,
        claims: &UserClaims,
        id: Uuid,
        submitted: RenewBookForm,
    ) -> AppResult<BookInstance> {
        claims.require(Capability::CanMarkReturned)?;
        let instance = self.store.get_book_instance(id).await?;
        let due_back = submitted.clean(today())?;

        let renewed = self.store.set_due_back(instance.id, due_back).await?;
        tracing::info!(
            instance = %renewed.id,
            librarian = %claims.sub,
            due_back = %due_back,
            "Renewed loan"
        );
        Ok(renewed)
    }

    async fn view(
        &self,
        id: Uuid,
        today: NaiveDate,
        values: Map<String, Value>,
        errors: FieldErrors,
    ) -> AppResult<RenewalView> {
        let instance = self.store.get_book_instance(id).await?;
        let book = self.store.get_book(instance.book_id).await?;

        Ok(RenewalView {
            bookinst: BookInstanceView {
                is_overdue: instance.is_overdue(today),
                book_title: book.title,
                instance,
            },
            form: FormView::new(RENEWAL_FIELDS, values).with_errors(errors),
        })
    }
}
