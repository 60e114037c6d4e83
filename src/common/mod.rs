pub mod db_errors;

pub use db_errors::{format_db_error, DbErrorKind};
