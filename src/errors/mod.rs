//! Domain-specific error types for the airfare registries
//!
//! # Error Categories
//!
//! - **AirfareError**: city registry, connection registry and route search
//!   (validation, conflicts, unknown ids, external service failures)
//! - **AuthError**: admin login and session token verification
//!
//! With the `server` feature both types render as JSON error bodies with a
//! stable error code and an HTTP status.
//!
//! # Examples
//!
//! ```rust
//! use airfare::errors::AirfareError;
//!
//! let err = AirfareError::not_found("City", 7);
//! assert_eq!(err.to_string(), "City with ID 7 not found.");
//! assert!(err.is_not_found());
//! ```

pub mod airfare;
pub mod auth;

pub use airfare::AirfareError;
pub use auth::AuthError;

/// Result type alias for registry and search operations
pub type AirfareResult<T> = Result<T, AirfareError>;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
