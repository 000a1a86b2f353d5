//! Repository layer for book storage

pub mod books;
pub mod memory;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::book::{Book, BookRecord},
};

pub use books::BooksRepository;
pub use memory::MemoryBookStore;

/// Storage operations the book service relies on.
///
/// Implementations must enforce isbn uniqueness themselves: a `save` that
/// would duplicate an isbn fails with `AppError::Conflict`, whatever the
/// caller checked beforehand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>>;

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool>;

    /// Exact author match, ignoring case
    async fn find_by_author_ignore_case(&self, author: &str) -> AppResult<Vec<Book>>;

    async fn find_by_available(&self, available: bool) -> AppResult<Vec<Book>>;

    /// Insert when `record.id` is `None`, otherwise update the row with that id.
    async fn save(&self, record: BookRecord) -> AppResult<Book>;

    /// Returns whether a row was removed
    async fn delete_by_id(&self, id: i64) -> AppResult<bool>;
}
