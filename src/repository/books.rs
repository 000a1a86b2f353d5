//! PostgreSQL book store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookRecord},
};

const BOOK_COLUMNS: &str =
    "id, title, author, isbn, publication_year, available, created_at, updated_at";

/// Turn a unique-index violation into a conflict; other errors pass through.
fn map_write_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            tracing::warn!("Unique constraint violated on books: {}", db.message());
            AppError::Conflict("ISBN already exists".to_string())
        }
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn insert(&self, record: &BookRecord) -> AppResult<Book> {
        let query = format!(
            r#"
            INSERT INTO books (title, author, isbn, publication_year, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(&record.title)
            .bind(&record.author)
            .bind(&record.isbn)
            .bind(record.publication_year)
            .bind(record.available)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    /// `created_at` is never written by an update.
    async fn update(&self, id: i64, record: &BookRecord) -> AppResult<Book> {
        let query = format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, isbn = $4, publication_year = $5,
                available = $6, updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(&record.title)
            .bind(&record.author)
            .bind(&record.isbn)
            .bind(record.publication_year)
            .bind(record.available)
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| AppError::NotFound(format!("Book not found with id: {}", id)))
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn find_all(&self) -> AppResult<Vec<Book>> {
        let query = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);
        let rows = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let row = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_by_author_ignore_case(&self, author: &str) -> AppResult<Vec<Book>> {
        let query = format!(
            "SELECT {} FROM books WHERE LOWER(author) = LOWER($1) ORDER BY id",
            BOOK_COLUMNS
        );
        let rows = sqlx::query_as::<_, Book>(&query)
            .bind(author)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_available(&self, available: bool) -> AppResult<Vec<Book>> {
        let query = format!(
            "SELECT {} FROM books WHERE available = $1 ORDER BY id",
            BOOK_COLUMNS
        );
        let rows = sqlx::query_as::<_, Book>(&query)
            .bind(available)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn save(&self, record: BookRecord) -> AppResult<Book> {
        match record.id {
            None => self.insert(&record).await,
            Some(id) => self.update(id, &record).await,
        }
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
