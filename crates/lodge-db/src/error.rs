use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    /// The named entity does not exist (or is soft-deleted).
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("caller does not own this {0}")]
    Forbidden(&'static str),

    /// Not every night of the requested stay has an available inventory row.
    #[error("requested dates are not available")]
    Unavailable,

    #[error("{0}")]
    Conflict(String),

    #[error("record already exists")]
    AlreadyExists,

    #[error("related record not found")]
    InvalidReference,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("storage error")]
    Sqlite(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(error: rusqlite::Error) -> Self {
        let constraint = match &error {
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                Some(err.extended_code)
            }
            _ => None,
        };

        match constraint {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                Self::AlreadyExists
            }
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => Self::InvalidReference,
            Some(ffi::SQLITE_CONSTRAINT_CHECK) => Self::InvalidData("check constraint failed".into()),
            _ => Self::Sqlite(error),
        }
    }
}
