//! Shared fixtures: an in-memory store enforcing the same integrity rules as
//! the database schema, and a router wired onto it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use local_library_server::{
    config::{AppConfig, AuthConfig},
    create_router,
    error::{AppError, AppResult},
    models::{
        Author, AuthorFields, Book, BookCopy, BookFields, BookInstance, BookSummary, Capability,
        CatalogCounts, Genre, LoanStatus, LoanedCopy, PageRequest, User, UserClaims,
    },
    repository::{AccountStore, CatalogStore},
    services::{auth::hash_password, sessions::MemorySessionStore, today, Services},
    AppState,
};

pub const JWT_SECRET: &str = "integration-secret";
pub const LIBRARIAN_ID: i32 = 1;
pub const READER_ID: i32 = 2;
pub const EDITOR_ID: i32 = 3;
/// Password of every seeded account
pub const PASSWORD: &str = "library-password";

fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

#[derive(Default)]
struct Data {
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    genres: BTreeMap<i32, Genre>,
    book_genres: Vec<(i32, i32)>,
    instances: BTreeMap<Uuid, BookInstance>,
    users: Vec<(User, Vec<Capability>)>,
    next_id: i32,
}

impl Data {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_book_refs(&self, fields: &BookFields) -> AppResult<()> {
        if let Some(author_id) = fields.author_id {
            if !self.authors.contains_key(&author_id) {
                return Err(AppError::Storage("books_author_id_fkey".into()));
            }
        }
        if fields.genre_ids.iter().any(|id| !self.genres.contains_key(id)) {
            return Err(AppError::Storage("book_genres_genre_id_fkey".into()));
        }
        Ok(())
    }

    fn replace_genres(&mut self, book_id: i32, genre_ids: &[i32]) {
        self.book_genres.retain(|(book, _)| *book != book_id);
        self.book_genres
            .extend(genre_ids.iter().map(|genre| (book_id, *genre)));
    }
}

/// Catalog and account store held in memory
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

/// Ids of the seeded copies
pub struct Fixture {
    /// On loan to the reader, due in three days
    pub reader_loan: Uuid,
    /// On loan to the librarian, overdue
    pub librarian_loan: Uuid,
    /// Available on the shelf
    pub available: Uuid,
    pub le_guin: i32,
    pub earthsea: i32,
}

impl MemoryStore {
    /// A small catalog: two authors, three books, three copies and three accounts
    pub fn seeded() -> (Self, Fixture) {
        let store = Self::default();
        let fixture = {
            let mut guard = store.data.lock().unwrap();
            let data = &mut *guard;

            for (name, capabilities) in [
                ("librarian", Capability::ALL.to_vec()),
                ("reader", vec![]),
                ("editor", vec![Capability::AuthorEdit, Capability::BookEdit]),
            ] {
                let id = data.next_id();
                let user = User {
                    id,
                    username: name.to_string(),
                    password_hash: password_hash(),
                };
                data.users.push((user, capabilities));
            }

            let genre = |data: &mut Data, name: &str| {
                let id = data.next_id();
                data.genres.insert(id, Genre { id, name: name.into() });
                id
            };
            let fantasy = genre(data, "Fantasy");
            let science_fiction = genre(data, "Science Fiction");

            let le_guin = data.next_id();
            data.authors.insert(
                le_guin,
                Author {
                    id: le_guin,
                    first_name: "Ursula".into(),
                    last_name: "Le Guin".into(),
                    date_of_birth: NaiveDate::from_ymd_opt(1929, 10, 21).unwrap(),
                    date_of_death: NaiveDate::from_ymd_opt(2018, 1, 22),
                },
            );
            let herbert = data.next_id();
            data.authors.insert(
                herbert,
                Author {
                    id: herbert,
                    first_name: "Frank".into(),
                    last_name: "Herbert".into(),
                    date_of_birth: NaiveDate::from_ymd_opt(1920, 10, 8).unwrap(),
                    date_of_death: NaiveDate::from_ymd_opt(1986, 2, 11),
                },
            );

            let book = |data: &mut Data, title: &str, author: i32, genre: i32| {
                let id = data.next_id();
                data.books.insert(
                    id,
                    Book {
                        id,
                        title: title.into(),
                        author_id: Some(author),
                        summary: format!("Summary of {}", title),
                        isbn: format!("978000000{:04}", id),
                    },
                );
                data.book_genres.push((id, genre));
                id
            };
            let earthsea = book(data, "A Wizard of Earthsea", le_guin, fantasy);
            let dispossessed = book(data, "The Dispossessed", le_guin, science_fiction);
            book(data, "Dune", herbert, science_fiction);

            let copy = |data: &mut Data,
                        book_id: i32,
                        status: LoanStatus,
                        due: Option<NaiveDate>,
                        borrower: Option<i32>| {
                let id = Uuid::new_v4();
                data.instances.insert(
                    id,
                    BookInstance {
                        id,
                        book_id,
                        imprint: "Fixture imprint".into(),
                        due_back: due,
                        status,
                        borrower_id: borrower,
                    },
                );
                id
            };
            let today = today();
            let reader_loan = copy(
                data,
                earthsea,
                LoanStatus::OnLoan,
                Some(today + Duration::days(3)),
                Some(READER_ID),
            );
            let librarian_loan = copy(
                data,
                dispossessed,
                LoanStatus::OnLoan,
                Some(today - Duration::days(2)),
                Some(LIBRARIAN_ID),
            );
            let available = copy(data, earthsea, LoanStatus::Available, None, None);

            Fixture {
                reader_loan,
                librarian_loan,
                available,
                le_guin,
                earthsea,
            }
        };
        (store, fixture)
    }

    pub fn instance(&self, id: Uuid) -> Option<BookInstance> {
        self.data.lock().unwrap().instances.get(&id).cloned()
    }

    pub fn instances(&self) -> Vec<BookInstance> {
        self.data.lock().unwrap().instances.values().cloned().collect()
    }

    pub fn author(&self, id: i32) -> Option<Author> {
        self.data.lock().unwrap().authors.get(&id).cloned()
    }

    pub fn book(&self, id: i32) -> Option<Book> {
        self.data.lock().unwrap().books.get(&id).cloned()
    }

    pub fn author_count(&self) -> usize {
        self.data.lock().unwrap().authors.len()
    }

    pub fn book_count(&self) -> usize {
        self.data.lock().unwrap().books.len()
    }

    /// Put a new copy of `book_id` on loan to `borrower_id`
    pub fn lend(&self, book_id: i32, borrower_id: i32, due_back: Option<NaiveDate>) -> Uuid {
        let id = Uuid::new_v4();
        self.data.lock().unwrap().instances.insert(
            id,
            BookInstance {
                id,
                book_id,
                imprint: "Loan imprint".into(),
                due_back,
                status: LoanStatus::OnLoan,
                borrower_id: Some(borrower_id),
            },
        );
        id
    }
}

fn page_of<T>(rows: Vec<T>, page: PageRequest) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let rows = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (rows, total)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn counts(&self) -> AppResult<CatalogCounts> {
        let data = self.data.lock().unwrap();
        Ok(CatalogCounts {
            num_books: data.books.len() as i64,
            num_instances: data.instances.len() as i64,
            num_instances_available: data
                .instances
                .values()
                .filter(|i| i.status == LoanStatus::Available)
                .count() as i64,
            num_authors: data.authors.len() as i64,
            num_genres: data.genres.len() as i64,
        })
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let data = self.data.lock().unwrap();
        let mut genres: Vec<Genre> = data.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn list_books(&self, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)> {
        let data = self.data.lock().unwrap();
        let mut books: Vec<&Book> = data.books.values().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        let rows = books
            .into_iter()
            .map(|book| {
                let author = book.author_id.and_then(|id| data.authors.get(&id));
                BookSummary::new(book, author)
            })
            .collect();
        Ok(page_of(rows, page))
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.book(id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn book_genres(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let data = self.data.lock().unwrap();
        let mut genres: Vec<Genre> = data
            .book_genres
            .iter()
            .filter(|(book, _)| *book == book_id)
            .filter_map(|(_, genre)| data.genres.get(genre).cloned())
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn book_copies(&self, book_id: i32) -> AppResult<Vec<BookCopy>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .instances
            .values()
            .filter(|i| i.book_id == book_id)
            .map(|i| BookCopy {
                id: i.id,
                imprint: i.imprint.clone(),
                status: i.status,
                due_back: i.due_back,
                is_overdue: false,
            })
            .collect())
    }

    async fn create_book(&self, fields: &BookFields) -> AppResult<Book> {
        let mut data = self.data.lock().unwrap();
        data.check_book_refs(fields)?;
        let id = data.next_id();
        let book = Book {
            id,
            title: fields.title.clone(),
            author_id: fields.author_id,
            summary: fields.summary.clone(),
            isbn: fields.isbn.clone(),
        };
        data.books.insert(id, book.clone());
        data.replace_genres(id, &fields.genre_ids);
        Ok(book)
    }

    async fn update_book(&self, id: i32, fields: &BookFields) -> AppResult<Book> {
        let mut data = self.data.lock().unwrap();
        if !data.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        data.check_book_refs(fields)?;
        let book = Book {
            id,
            title: fields.title.clone(),
            author_id: fields.author_id,
            summary: fields.summary.clone(),
            isbn: fields.isbn.clone(),
        };
        data.books.insert(id, book.clone());
        data.replace_genres(id, &fields.genre_ids);
        Ok(book)
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut data = self.data.lock().unwrap();
        if !data.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        if data.instances.values().any(|i| i.book_id == id) {
            return Err(AppError::Storage("book_instances_book_id_fkey".into()));
        }
        data.books.remove(&id);
        data.replace_genres(id, &[]);
        Ok(())
    }

    async fn list_authors(&self, page: PageRequest) -> AppResult<(Vec<Author>, i64)> {
        let authors = self.all_authors().await?;
        Ok(page_of(authors, page))
    }

    async fn all_authors(&self) -> AppResult<Vec<Author>> {
        let data = self.data.lock().unwrap();
        let mut authors: Vec<Author> = data.authors.values().cloned().collect();
        authors.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then(a.first_name.cmp(&b.first_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(authors)
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.author(id)
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn author_books(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let data = self.data.lock().unwrap();
        let mut books: Vec<Book> = data
            .books
            .values()
            .filter(|b| b.author_id == Some(author_id))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn create_author(&self, fields: &AuthorFields) -> AppResult<Author> {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        let author = Author {
            id,
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            date_of_birth: fields.date_of_birth,
            date_of_death: fields.date_of_death,
        };
        data.authors.insert(id, author.clone());
        Ok(author)
    }

    async fn update_author(&self, id: i32, fields: &AuthorFields) -> AppResult<Author> {
        let mut data = self.data.lock().unwrap();
        let author = data
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;
        author.first_name = fields.first_name.clone();
        author.last_name = fields.last_name.clone();
        author.date_of_birth = fields.date_of_birth;
        author.date_of_death = fields.date_of_death;
        Ok(author.clone())
    }

    async fn delete_author(&self, id: i32) -> AppResult<()> {
        let mut data = self.data.lock().unwrap();
        if !data.authors.contains_key(&id) {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        if data.books.values().any(|b| b.author_id == Some(id)) {
            return Err(AppError::Storage("books_author_id_fkey".into()));
        }
        data.authors.remove(&id);
        Ok(())
    }

    async fn get_book_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.instance(id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedCopy>, i64)> {
        let data = self.data.lock().unwrap();
        let mut loans: Vec<&BookInstance> = data
            .instances
            .values()
            .filter(|i| i.status == LoanStatus::OnLoan)
            .filter(|i| borrower_id.is_none() || i.borrower_id == borrower_id)
            .collect();
        // NULL due dates last
        loans.sort_by(|a, b| {
            (a.due_back.is_none(), a.due_back, a.id).cmp(&(b.due_back.is_none(), b.due_back, b.id))
        });

        let rows = loans
            .into_iter()
            .map(|i| LoanedCopy {
                id: i.id,
                book_id: i.book_id,
                book_title: data
                    .books
                    .get(&i.book_id)
                    .map(|b| b.title.clone())
                    .unwrap_or_default(),
                imprint: i.imprint.clone(),
                due_back: i.due_back,
                borrower_id: i.borrower_id,
                borrower: i.borrower_id.and_then(|id| {
                    data.users
                        .iter()
                        .find(|(u, _)| u.id == id)
                        .map(|(u, _)| u.username.clone())
                }),
                is_overdue: false,
            })
            .collect();
        Ok(page_of(rows, page))
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let mut data = self.data.lock().unwrap();
        let instance = data
            .instances
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))?;
        instance.due_back = Some(due_back);
        Ok(instance.clone())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .users
            .iter()
            .find(|(u, _)| u.username.eq_ignore_ascii_case(username))
            .map(|(u, _)| u.clone()))
    }

    async fn user_capabilities(&self, user_id: i32) -> AppResult<Vec<Capability>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(_, caps)| caps.clone())
            .unwrap_or_default())
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        capabilities: &[Capability],
    ) -> AppResult<User> {
        let mut data = self.data.lock().unwrap();
        if data
            .users
            .iter()
            .any(|(u, _)| u.username.eq_ignore_ascii_case(username))
        {
            return Err(AppError::Storage("users_username_key".into()));
        }
        let id = data.next_id();
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        data.users.push((user.clone(), capabilities.to_vec()));
        Ok(user)
    }
}

/// Router over a seeded in-memory store
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub fixture: Fixture,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let (store, fixture) = MemoryStore::seeded();
        let store = Arc::new(store);

        let auth = AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiration_hours: 1,
            bootstrap_username: None,
            bootstrap_password: None,
        };
        let services = Services::new(
            store.clone(),
            store.clone(),
            auth.clone(),
            Arc::new(MemorySessionStore::new()),
        );
        let config = AppConfig {
            auth,
            ..AppConfig::default()
        };
        let router = create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        });

        Self {
            store,
            fixture,
            router,
        }
    }

    /// Bearer token for one of the seeded accounts
    pub fn token(&self, user_id: i32) -> String {
        let (username, capabilities) = match user_id {
            LIBRARIAN_ID => ("librarian", Capability::ALL.to_vec()),
            READER_ID => ("reader", vec![]),
            EDITOR_ID => ("editor", vec![Capability::AuthorEdit, Capability::BookEdit]),
            other => panic!("no seeded user {}", other),
        };
        let now = Utc::now().timestamp();
        UserClaims {
            sub: username.to_string(),
            user_id,
            capabilities,
            exp: now + 3600,
            iat: now,
        }
        .create_token(JWT_SECRET)
        .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, user: Option<i32>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, user: Option<i32>, body: Value) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
}
