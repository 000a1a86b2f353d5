//! Book catalog service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::book::{next_update_time, timestamp_now, Book, BookFields, BookRecord},
    repository::BookStore,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book not found with id: {}", id))
}

fn duplicate_isbn() -> AppError {
    AppError::Conflict("ISBN already exists".to_string())
}

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        self.store.find_all().await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        self.store.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        self.store.find_by_available(true).await
    }

    /// Books whose author equals `author`, ignoring case
    pub async fn list_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        self.store.find_by_author_ignore_case(author).await
    }

    /// Create a book. New books are available, with both timestamps set to now.
    pub async fn create(&self, fields: BookFields) -> AppResult<Book> {
        if self.store.exists_by_isbn(&fields.isbn).await? {
            tracing::warn!("Rejected book creation: ISBN {} already exists", fields.isbn);
            return Err(duplicate_isbn());
        }

        let book = self.store.save(BookRecord::new(fields, timestamp_now())).await?;
        tracing::info!("Created book id={} isbn={}", book.id, book.isbn);
        Ok(book)
    }

    /// Replace title, author, isbn and publication year of an existing book.
    pub async fn update(&self, id: i64, fields: BookFields) -> AppResult<Book> {
        let existing = self.get_by_id(id).await?;

        if existing.isbn != fields.isbn && self.store.exists_by_isbn(&fields.isbn).await? {
            tracing::warn!(
                "Rejected update of book id={}: ISBN {} belongs to another book",
                id,
                fields.isbn
            );
            return Err(duplicate_isbn());
        }

        let updated_at = next_update_time(existing.updated_at, timestamp_now());
        let mut record = BookRecord::from(existing);
        record.title = fields.title;
        record.author = fields.author;
        record.isbn = fields.isbn;
        record.publication_year = fields.publication_year;
        record.updated_at = updated_at;

        let book = self.store.save(record).await?;
        tracing::info!("Updated book id={}", book.id);
        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.store.delete_by_id(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }
}
