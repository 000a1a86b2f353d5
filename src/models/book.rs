//! Book model and related types

use chrono::{DateTime, Datelike, Duration, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{13}$").expect("valid ISBN pattern"));

/// Stored book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// 13-digit ISBN, unique across all books
    pub isbn: String,
    pub publication_year: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row handed to a store for saving. `id: None` inserts, `Some(id)` updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookRecord {
    /// New, unsaved record from validated fields.
    pub fn new(fields: BookFields, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: fields.title,
            author: fields.author,
            isbn: fields.isbn,
            publication_year: fields.publication_year,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_book(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publication_year: self.publication_year,
            available: self.available,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        Self {
            id: Some(book.id),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            publication_year: book.publication_year,
            available: book.available,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Create / update book request.
///
/// Every field is optional on the wire so a missing field is reported as a
/// validation message rather than a malformed body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "not_blank", message = "Title is required"),
        length(max = 200, message = "Title must not exceed 200 characters")
    )]
    #[schema(example = "SQL in Action")]
    pub title: Option<String>,
    #[validate(
        required(message = "Author is required"),
        custom(function = "not_blank", message = "Author is required"),
        length(max = 100, message = "Author must not exceed 100 characters")
    )]
    #[schema(example = "Craig Walls")]
    pub author: Option<String>,
    #[validate(
        required(message = "ISBN is required"),
        regex(path = *ISBN_RE, message = "ISBN must be exactly 13 digits")
    )]
    #[schema(example = "9781617298546")]
    pub isbn: Option<String>,
    #[validate(
        required(message = "Publication year is required"),
        range(min = 1000, message = "Publication year must be at least 1000"),
        custom(
            function = "not_after_current_year",
            message = "Publication year must not exceed the current year"
        )
    )]
    #[serde(rename = "publicationYear")]
    #[schema(example = 2021)]
    pub publication_year: Option<i32>,
}

/// Validated book fields, ready for the service layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn not_after_current_year(year: i32) -> Result<(), ValidationError> {
    if year > current_year() {
        return Err(ValidationError::new("year_max"));
    }
    Ok(())
}

/// Current time at the microsecond precision PostgreSQL keeps.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

impl BookRequest {
    /// Run every rule, collecting all failures, and produce the validated fields.
    pub fn into_fields(self) -> Result<BookFields, ValidationErrors> {
        self.validate()?;

        match self {
            BookRequest {
                title: Some(title),
                author: Some(author),
                isbn: Some(isbn),
                publication_year: Some(publication_year),
            } => Ok(BookFields {
                title,
                author,
                isbn,
                publication_year,
            }),
            // `required` already reported any missing field
            _ => Err(ValidationErrors::new()),
        }
    }
}

/// Timestamp for a modification, strictly after `previous`.
pub fn next_update_time(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::field_messages;

    fn request(isbn: &str, year: i32) -> BookRequest {
        BookRequest {
            title: Some("SQL in Action".to_string()),
            author: Some("Craig Walls".to_string()),
            isbn: Some(isbn.to_string()),
            publication_year: Some(year),
        }
    }

    #[test]
    fn test_valid_request() {
        let fields = request("9781617298546", 2021).into_fields().unwrap();
        assert_eq!(fields.title, "SQL in Action");
        assert_eq!(fields.author, "Craig Walls");
        assert_eq!(fields.isbn, "9781617298546");
        assert_eq!(fields.publication_year, 2021);
    }

    #[test]
    fn test_isbn_format() {
        assert!(request("1234567890123", 2020).into_fields().is_ok());

        for bad in ["123456789012", "12345678901a", "12345678901234", "978-161729854", ""] {
            let errors = request(bad, 2020).into_fields().unwrap_err();
            let map = field_messages(&errors);
            assert_eq!(map["isbn"], "ISBN must be exactly 13 digits", "isbn {:?}", bad);
        }
    }

    #[test]
    fn test_isbn_rejects_non_ascii_digits() {
        assert!(request("١٢٣٤٥٦٧٨٩٠١٢٣", 2020).into_fields().is_err());
    }

    #[test]
    fn test_publication_year_bounds() {
        let year = current_year();
        assert!(request("1234567890123", 1000).into_fields().is_ok());
        assert!(request("1234567890123", year).into_fields().is_ok());

        let low = field_messages(&request("1234567890123", 999).into_fields().unwrap_err());
        assert_eq!(low["publicationYear"], "Publication year must be at least 1000");

        let high = field_messages(&request("1234567890123", year + 1).into_fields().unwrap_err());
        assert_eq!(high["publicationYear"], "Publication year must not exceed the current year");
    }

    #[test]
    fn test_blank_text_is_reported_as_missing() {
        let mut req = request("1234567890123", 2020);
        req.author = Some("\t \n".to_string());
        let map = field_messages(&req.into_fields().unwrap_err());
        assert_eq!(map.len(), 1);
        assert_eq!(map["author"], "Author is required");
    }

    #[test]
    fn test_missing_fields_report_required() {
        let map = field_messages(&BookRequest::default().into_fields().unwrap_err());
        assert_eq!(map.len(), 4);
        assert_eq!(map["title"], "Title is required");
        assert_eq!(map["author"], "Author is required");
        assert_eq!(map["isbn"], "ISBN is required");
        assert_eq!(map["publicationYear"], "Publication year is required");
    }

    #[test]
    fn test_collects_every_failure() {
        let errors = BookRequest {
            title: Some("   ".to_string()),
            author: Some("a".repeat(101)),
            isbn: None,
            publication_year: None,
        }
        .into_fields()
        .unwrap_err();

        let map = field_messages(&errors);
        assert_eq!(map.len(), 4);
        assert_eq!(map["title"], "Title is required");
        assert_eq!(map["author"], "Author must not exceed 100 characters");
        assert_eq!(map["isbn"], "ISBN is required");
        assert_eq!(map["publicationYear"], "Publication year is required");
    }

    #[test]
    fn test_length_counts_characters() {
        let mut req = request("1234567890123", 2020);
        req.title = Some("é".repeat(200));
        assert!(req.clone().into_fields().is_ok());
        req.title = Some("é".repeat(201));
        assert!(req.into_fields().is_err());
    }

    #[test]
    fn test_next_update_time_is_strictly_later() {
        let t = Utc::now();
        assert!(next_update_time(t, t) > t);
        assert!(next_update_time(t, t - Duration::seconds(5)) > t);
        let later = t + Duration::seconds(1);
        assert_eq!(next_update_time(t, later), later);
    }

    #[test]
    fn test_timestamp_now_has_microsecond_precision() {
        assert_eq!(timestamp_now().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_book_json_uses_camel_case() {
        let now = Utc::now();
        let fields = request("1234567890123", 2020).into_fields().unwrap();
        let book = BookRecord::new(fields, now).into_book(7);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["publicationYear"], 2020);
        assert_eq!(json["available"], true);
        assert!(json["createdAt"].is_string());
        assert_eq!(json["createdAt"], json["updatedAt"]);
    }
}
