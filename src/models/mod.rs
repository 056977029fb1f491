//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod counts;
pub mod form;
pub mod genre;
pub mod pagination;
pub mod renewal;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetail, AuthorFields, AuthorForm, AuthorSummary};
pub use book::{Book, BookDetail, BookFields, BookForm, BookSummary};
pub use book_instance::{BookCopy, BookInstance, BookInstanceView, LoanStatus, LoanedCopy};
pub use counts::CatalogCounts;
pub use genre::Genre;
pub use pagination::{PageQuery, PageRequest, PAGE_SIZE};
pub use renewal::{RenewBookForm, RenewalView};
pub use user::{Capability, User, UserClaims};
