//! Database error categorization and message formatting
//!
//! The city and connection registries rely on the store for their uniqueness
//! guarantees, so a failed insert has to be told apart from an outage. This
//! module sorts `DbErr` values into the handful of kinds the HTTP layer and
//! the registries care about.
//!
//! # Examples
//!
//! ```rust
//! use airfare::common::db_errors::*;
//! use sea_orm::DbErr;
//!
//! let err = DbErr::RecordNotFound("City not found".to_string());
//! let (kind, message) = format_db_error("find city", &err);
//!
//! assert_eq!(kind, DbErrorKind::NotFound);
//! assert_eq!(message, "find city: record not found");
//! ```

use sea_orm::{DbErr, SqlErr};

/// Categories of database errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Record not found (query returned no results)
    NotFound,

    /// Unique constraint violation
    ///
    /// For `cities.name` this is a duplicate normalized city name.
    UniqueViolation,

    /// Foreign key constraint violation
    ForeignKeyViolation,

    /// Database connection error
    ConnectionError,

    /// Query or pool acquisition timeout
    Timeout,

    /// SQLite reported the database as busy or locked
    Busy,

    /// Unknown/other database error
    Unknown,
}

impl DbErrorKind {
    /// Categorize a sea_orm database error
    ///
    /// ```
    /// use airfare::common::db_errors::DbErrorKind;
    /// use sea_orm::DbErr;
    ///
    /// let err = DbErr::RecordNotFound("City not found".to_string());
    /// assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::NotFound);
    /// ```
    pub fn from_db_err(err: &DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => return Self::UniqueViolation,
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => return Self::ForeignKeyViolation,
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::Conn(_) => {
                if err.to_string().to_lowercase().contains("timeout") {
                    Self::Timeout
                } else {
                    Self::ConnectionError
                }
            }
            _ => {
                let msg_lower = err.to_string().to_lowercase();
                if msg_lower.contains("unique") || msg_lower.contains("duplicate") {
                    Self::UniqueViolation
                } else if msg_lower.contains("foreign key") {
                    Self::ForeignKeyViolation
                } else if msg_lower.contains("database is locked") || msg_lower.contains("busy") {
                    Self::Busy
                } else if msg_lower.contains("timed out") || msg_lower.contains("timeout") {
                    Self::Timeout
                } else {
                    Self::Unknown
                }
            }
        }
    }

    /// Get appropriate HTTP status code for this error kind
    ///
    /// ```
    /// use airfare::common::db_errors::DbErrorKind;
    ///
    /// assert_eq!(DbErrorKind::NotFound.http_status_code(), 404);
    /// assert_eq!(DbErrorKind::UniqueViolation.http_status_code(), 409);
    /// assert_eq!(DbErrorKind::ConnectionError.http_status_code(), 503);
    /// ```
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::UniqueViolation => 409,
            Self::ForeignKeyViolation => 400,
            Self::ConnectionError => 503,
            Self::Timeout => 504,
            Self::Busy => 503,
            Self::Unknown => 500,
        }
    }

    /// Errors caused by client input (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::UniqueViolation | Self::ForeignKeyViolation
        )
    }
}

/// Format database error with operation context
///
/// Returns the categorized kind together with a message prefixed by
/// `operation`, e.g. `"insert city: duplicate key violation"`.
pub fn format_db_error(operation: &str, err: &DbErr) -> (DbErrorKind, String) {
    let kind = DbErrorKind::from_db_err(err);

    let message = match kind {
        DbErrorKind::NotFound => format!("{}: record not found", operation),
        DbErrorKind::UniqueViolation => format!("{}: duplicate key violation", operation),
        DbErrorKind::ForeignKeyViolation => {
            format!("{}: foreign key constraint violation", operation)
        }
        DbErrorKind::ConnectionError => format!("{}: database connection failed", operation),
        DbErrorKind::Timeout => format!("{}: query timeout", operation),
        DbErrorKind::Busy => format!("{}: database busy", operation),
        DbErrorKind::Unknown => format!("{}: database error", operation),
    };

    (kind, message)
}
