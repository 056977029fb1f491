//! Repository layer for database operations

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod users;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Author, AuthorFields, Book, BookCopy, BookFields, BookInstance, BookSummary,
        Capability, CatalogCounts, Genre, LoanedCopy, PageRequest, User,
    },
};

/// Catalog persistence: books, authors, genres and copies.
///
/// Lookups of a single row fail with `AppError::NotFound`; constraint
/// violations surface as `AppError::Storage`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Round-trip to the backing store
    async fn ping(&self) -> AppResult<()>;

    async fn counts(&self) -> AppResult<CatalogCounts>;

    /// All genres, ordered by name
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;

    /// One page of books ordered by title, with the total row count
    async fn list_books(&self, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)>;
    async fn get_book(&self, id: i32) -> AppResult<Book>;
    async fn book_genres(&self, book_id: i32) -> AppResult<Vec<Genre>>;
    async fn book_copies(&self, book_id: i32) -> AppResult<Vec<BookCopy>>;
    async fn create_book(&self, fields: &BookFields) -> AppResult<Book>;
    async fn update_book(&self, id: i32, fields: &BookFields) -> AppResult<Book>;
    async fn delete_book(&self, id: i32) -> AppResult<()>;

    /// One page of authors ordered by last then first name, with the total row count
    async fn list_authors(&self, page: PageRequest) -> AppResult<(Vec<Author>, i64)>;
    /// Every author, in listing order
    async fn all_authors(&self) -> AppResult<Vec<Author>>;
    async fn get_author(&self, id: i32) -> AppResult<Author>;
    /// Books written by an author, ordered by title
    async fn author_books(&self, author_id: i32) -> AppResult<Vec<Book>>;
    async fn create_author(&self, fields: &AuthorFields) -> AppResult<Author>;
    async fn update_author(&self, id: i32, fields: &AuthorFields) -> AppResult<Author>;
    async fn delete_author(&self, id: i32) -> AppResult<()>;

    async fn get_book_instance(&self, id: Uuid) -> AppResult<BookInstance>;
    /// On-loan copies (optionally of one borrower) ordered by due date then id
    async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedCopy>, i64)>;
    /// Overwrite `due_back` of one copy, leaving every other column untouched
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance>;
}

/// User accounts and their capabilities
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn user_capabilities(&self, user_id: i32) -> AppResult<Vec<Capability>>;
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        capabilities: &[Capability],
    ) -> AppResult<User>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub book_instances: book_instances::BookInstancesRepository,
    pub genres: genres::GenresRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            book_instances: book_instances::BookInstancesRepository::new(pool.clone()),
            genres: genres::GenresRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Classify a driver error: integrity violations become `Storage`, the rest stay `Database`
pub(crate) fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() || db.is_unique_violation() || db.is_check_violation() {
            return AppError::Storage(db.message().to_string());
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl CatalogStore for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn counts(&self) -> AppResult<CatalogCounts> {
        let counts = sqlx::query_as::<_, CatalogCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS num_books,
                (SELECT COUNT(*) FROM book_instances) AS num_instances,
                (SELECT COUNT(*) FROM book_instances WHERE status = 'a') AS num_instances_available,
                (SELECT COUNT(*) FROM authors) AS num_authors,
                (SELECT COUNT(*) FROM genres) AS num_genres
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.genres.list().await
    }

    async fn list_books(&self, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)> {
        self.books.list(page).await
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    async fn book_genres(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        self.genres.for_book(book_id).await
    }

    async fn book_copies(&self, book_id: i32) -> AppResult<Vec<BookCopy>> {
        self.book_instances.for_book(book_id).await
    }

    async fn create_book(&self, fields: &BookFields) -> AppResult<Book> {
        self.books.create(fields).await
    }

    async fn update_book(&self, id: i32, fields: &BookFields) -> AppResult<Book> {
        self.books.update(id, fields).await
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.books.delete(id).await
    }

    async fn list_authors(&self, page: PageRequest) -> AppResult<(Vec<Author>, i64)> {
        self.authors.list(page).await
    }

    async fn all_authors(&self) -> AppResult<Vec<Author>> {
        self.authors.all().await
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.authors.get_by_id(id).await
    }

    async fn author_books(&self, author_id: i32) -> AppResult<Vec<Book>> {
        self.books.by_author(author_id).await
    }

    async fn create_author(&self, fields: &AuthorFields) -> AppResult<Author> {
        self.authors.create(fields).await
    }

    async fn update_author(&self, id: i32, fields: &AuthorFields) -> AppResult<Author> {
        self.authors.update(id, fields).await
    }

    async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.authors.delete(id).await
    }

    async fn get_book_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.book_instances.get_by_id(id).await
    }

    async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedCopy>, i64)> {
        self.book_instances.list_on_loan(borrower_id, page).await
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        self.book_instances.set_due_back(id, due_back).await
    }
}

#[async_trait]
impl AccountStore for Repository {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.users.find_by_username(username).await
    }

    async fn user_capabilities(&self, user_id: i32) -> AppResult<Vec<Capability>> {
        self.users.capabilities(user_id).await
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        capabilities: &[Capability],
    ) -> AppResult<User> {
        self.users.create(username, password_hash, capabilities).await
    }
}
