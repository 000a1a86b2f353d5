//! In-process book store, used by the `memory` backend and by tests

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookRecord},
};

#[derive(Default)]
struct State {
    last_id: i64,
    books: BTreeMap<i64, Book>,
}

impl State {
    fn isbn_taken(&self, isbn: &str, except: Option<i64>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except)
    }
}

/// Books kept in a map ordered by id. The write lock is held across the
/// uniqueness check and the write, so concurrent saves of one isbn admit one winner.
#[derive(Default)]
pub struct MemoryBookStore {
    state: RwLock<State>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn find_all(&self) -> AppResult<Vec<Book>> {
        Ok(self.state.read().await.books.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        Ok(self.state.read().await.isbn_taken(isbn, None))
    }

    async fn find_by_author_ignore_case(&self, author: &str) -> AppResult<Vec<Book>> {
        let wanted = author.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .filter(|b| b.author.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    async fn find_by_available(&self, available: bool) -> AppResult<Vec<Book>> {
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .filter(|b| b.available == available)
            .cloned()
            .collect())
    }

    async fn save(&self, record: BookRecord) -> AppResult<Book> {
        let mut state = self.state.write().await;

        if state.isbn_taken(&record.isbn, record.id) {
            return Err(AppError::Conflict("ISBN already exists".to_string()));
        }

        let book = match record.id {
            None => {
                state.last_id += 1;
                record.into_book(state.last_id)
            }
            Some(id) => {
                let created_at = state
                    .books
                    .get(&id)
                    .map(|existing| existing.created_at)
                    .ok_or_else(|| AppError::NotFound(format!("Book not found with id: {}", id)))?;
                let mut book = record.into_book(id);
                book.created_at = created_at;
                book
            }
        };

        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<bool> {
        Ok(self.state.write().await.books.remove(&id).is_some())
    }
}
