//! Book endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::book::{Book, BookRequest},
    AppState,
};

use super::{BookBody, PathParam, QueryParams};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorQuery {
    /// Author name, matched exactly but ignoring case
    pub author: Option<String>,
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list_all().await?;
    Ok(Json(books))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 400, description = "Invalid book ID", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// Find books by author
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(AuthorQuery),
    responses(
        (status = 200, description = "Books by this author (possibly none)", body = Vec<Book>),
        (status = 400, description = "Missing author parameter", body = ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<AuthorQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let author = query
        .author
        .ok_or_else(|| AppError::BadRequest("Query parameter 'author' is required".to_string()))?;

    let books = state.services.books.list_by_author(&author).await?;
    Ok(Json(books))
}

/// List books currently available
#[utoipa::path(
    get,
    path = "/books/available",
    tag = "books",
    responses(
        (status = 200, description = "Available books", body = Vec<Book>)
    )
)]
pub async fn list_available_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list_available().await?;
    Ok(Json(books))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "ISBN already exists", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    BookBody(fields): BookBody,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.books.create(fields).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "ISBN belongs to another book", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    BookBody(fields): BookBody,
) -> AppResult<Json<Book>> {
    let updated = state.services.books.update(id, fields).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Invalid book ID", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<StatusCode> {
    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
