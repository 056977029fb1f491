//! Capability-gated create/update/delete of authors and books

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::{
    error::{AppResult, FieldErrors},
    models::{
        author::AUTHOR_FIELDS,
        book::BOOK_FIELDS,
        form::{self, Choice, FormView},
        Author, AuthorForm, Book, BookForm, Capability, UserClaims,
    },
    repository::CatalogStore,
};

/// Suggested death date on a blank author form
pub const AUTHOR_INITIAL_DATE_OF_DEATH: &str = "2018-05-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Author,
    Book,
}

/// How one editable entity is exposed: its form fields, the capability
/// guarding every mutation, and where clients go after a write.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    pub entity: EntityKind,
    pub fields: &'static [&'static str],
    pub required: Capability,
    pub list_url: &'static str,
    detail_prefix: &'static str,
}

impl EntityDescriptor {
    pub const AUTHOR: EntityDescriptor = EntityDescriptor {
        entity: EntityKind::Author,
        fields: AUTHOR_FIELDS,
        required: Capability::AuthorEdit,
        list_url: "/api/v1/authors",
        detail_prefix: "/api/v1/authors/",
    };

    pub const BOOK: EntityDescriptor = EntityDescriptor {
        entity: EntityKind::Book,
        fields: BOOK_FIELDS,
        required: Capability::BookEdit,
        list_url: "/api/v1/books",
        detail_prefix: "/api/v1/books/",
    };

    pub fn guard(&self, claims: &UserClaims) -> AppResult<()> {
        claims.require(self.required)
    }

    pub fn detail_url(&self, id: i32) -> String {
        format!("{}{}", self.detail_prefix, id)
    }

    /// Whitelist a submitted payload to this entity's fields and read the raw form
    pub fn bind<T: DeserializeOwned>(&self, payload: Map<String, Value>) -> AppResult<T> {
        form::bind(self.fields, payload)
    }
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn CatalogStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    // Authors

    pub fn author_create_form(&self, claims: &UserClaims) -> AppResult<FormView> {
        EntityDescriptor::AUTHOR.guard(claims)?;
        let mut values = Map::new();
        values.insert("date_of_death".into(), json!(AUTHOR_INITIAL_DATE_OF_DEATH));
        Ok(FormView::new(AUTHOR_FIELDS, values))
    }

    pub async fn create_author(
        &self,
        claims: &UserClaims,
        payload: Map<String, Value>,
    ) -> AppResult<Author> {
        let descriptor = EntityDescriptor::AUTHOR;
        descriptor.guard(claims)?;
        let fields = descriptor.bind::<AuthorForm>(payload)?.clean()?;

        let author = self.store.create_author(&fields).await?;
        tracing::info!(author_id = author.id, user = %claims.sub, "Created author");
        Ok(author)
    }

    pub async fn author_update_form(&self, claims: &UserClaims, id: i32) -> AppResult<FormView> {
        EntityDescriptor::AUTHOR.guard(claims)?;
        let author = self.store.get_author(id).await?;
        Ok(FormView::new(AUTHOR_FIELDS, author.form_values()))
    }

    pub async fn update_author(
        &self,
        claims: &UserClaims,
        id: i32,
        payload: Map<String, Value>,
    ) -> AppResult<Author> {
        let descriptor = EntityDescriptor::AUTHOR;
        descriptor.guard(claims)?;
        self.store.get_author(id).await?;
        let fields = descriptor.bind::<AuthorForm>(payload)?.clean()?;

        let author = self.store.update_author(id, &fields).await?;
        tracing::info!(author_id = id, user = %claims.sub, "Updated author");
        Ok(author)
    }

    /// Delete an author; books still referencing them make the store refuse
    pub async fn delete_author(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        EntityDescriptor::AUTHOR.guard(claims)?;
        self.store.delete_author(id).await?;
        tracing::info!(author_id = id, user = %claims.sub, "Deleted author");
        Ok(())
    }

    // Books

    pub async fn book_create_form(&self, claims: &UserClaims) -> AppResult<FormView> {
        EntityDescriptor::BOOK.guard(claims)?;
        self.book_form(Map::new(), FieldErrors::new()).await
    }

    pub async fn create_book(
        &self,
        claims: &UserClaims,
        payload: Map<String, Value>,
    ) -> AppResult<Book> {
        let descriptor = EntityDescriptor::BOOK;
        descriptor.guard(claims)?;
        let submitted = descriptor.bind::<BookForm>(payload)?;
        let authors = self.store.all_authors().await?;
        let genres = self.store.list_genres().await?;
        let fields = submitted.clean(&authors, &genres)?;

        let book = self.store.create_book(&fields).await?;
        tracing::info!(book_id = book.id, user = %claims.sub, "Created book");
        Ok(book)
    }

    pub async fn book_update_form(&self, claims: &UserClaims, id: i32) -> AppResult<FormView> {
        EntityDescriptor::BOOK.guard(claims)?;
        let book = self.store.get_book(id).await?;
        let genre_ids: Vec<i32> = self
            .store
            .book_genres(id)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();
        self.book_form(book.form_values(&genre_ids), FieldErrors::new())
            .await
    }

    pub async fn update_book(
        &self,
        claims: &UserClaims,
        id: i32,
        payload: Map<String, Value>,
    ) -> AppResult<Book> {
        let descriptor = EntityDescriptor::BOOK;
        descriptor.guard(claims)?;
        self.store.get_book(id).await?;
        let submitted = descriptor.bind::<BookForm>(payload)?;
        let authors = self.store.all_authors().await?;
        let genres = self.store.list_genres().await?;
        let fields = submitted.clean(&authors, &genres)?;

        let book = self.store.update_book(id, &fields).await?;
        tracing::info!(book_id = id, user = %claims.sub, "Updated book");
        Ok(book)
    }

    /// Delete a book; remaining copies make the store refuse
    pub async fn delete_book(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        EntityDescriptor::BOOK.guard(claims)?;
        self.store.delete_book(id).await?;
        tracing::info!(book_id = id, user = %claims.sub, "Deleted book");
        Ok(())
    }

    /// Re-render a form with the submitted values and the errors they produced
    pub async fn rejected_form(
        &self,
        claims: &UserClaims,
        descriptor: EntityDescriptor,
        payload: Map<String, Value>,
        errors: FieldErrors,
    ) -> AppResult<FormView> {
        descriptor.guard(claims)?;
        let values = form::whitelist(descriptor.fields, payload);
        match descriptor.entity {
            EntityKind::Author => Ok(FormView::new(descriptor.fields, values).with_errors(errors)),
            EntityKind::Book => self.book_form(values, errors).await,
        }
    }

    async fn book_form(&self, values: Map<String, Value>, errors: FieldErrors) -> AppResult<FormView> {
        let authors = self.store.all_authors().await?;
        let genres = self.store.list_genres().await?;
        Ok(FormView::new(BOOK_FIELDS, values)
            .with_choices("author", authors.iter().map(Choice::from).collect())
            .with_choices("genre", genres.iter().map(Choice::from).collect())
            .with_errors(errors))
    }
}
