use std::str::FromStr;

use atelier_core::{AppError, AppResult};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Parses a stored text column back into its domain value.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    T::from_str(value)
        .map_err(|error| AppError::Internal(format!("invalid stored {column} '{value}': {error}")))
}

/// Converts a stored `BIGINT` counter into `u64`.
pub(crate) fn unsigned_column(column: &str, value: i64) -> AppResult<u64> {
    u64::try_from(value)
        .map_err(|error| AppError::Internal(format!("invalid stored {column} {value}: {error}")))
}

/// Converts a counter into a `BIGINT` bind value.
pub(crate) fn signed_column(column: &str, value: u64) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|error| AppError::Internal(format!("{column} {value} does not fit BIGINT: {error}")))
}

/// Maps constraint violations to conflicts; everything else is a store failure.
pub(crate) fn map_write_error(error: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return AppError::Conflict(format!("{context}: name is already taken"));
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return AppError::Conflict(format!(
                    "{context}: a referenced record is missing or still in use"
                ));
            }
            _ => {}
        }
    }

    AppError::Dependency(format!("{context}: {error}"))
}

/// Wraps a plain store failure.
pub(crate) fn store_error(context: &str, error: sqlx::Error) -> AppError {
    AppError::Dependency(format!("{context}: {error}"))
}
