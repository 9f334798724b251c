use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a [`Store`](crate::Store) backend.
///
/// A record that simply does not exist is not an error: lookups return
/// `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no row with id {id} in table '{table}'")]
    MissingRow { table: &'static str, id: i64 },

    #[error("author {0} does not exist")]
    MissingAuthor(i64),

    #[error("store lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
