use async_trait::async_trait;

use crate::error::StoreResult;
use crate::migrate::Migration;
use crate::models::{Author, Book, NewAuthor, NewBook};

/// CRUD primitives over authors and books.
///
/// Listing methods return rows ordered by id. Lookups by id or natural key
/// return `Ok(None)` when nothing matches.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new author and return it with its assigned id.
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author>;

    async fn author(&self, id: i64) -> StoreResult<Option<Author>>;

    /// Exact, case-sensitive match on `(first_name, last_name)`.
    /// When duplicates exist the lowest id wins.
    async fn find_author(&self, first_name: &str, last_name: &str)
        -> StoreResult<Option<Author>>;

    /// Overwrite both name fields of an existing author.
    async fn update_author(&self, author: &Author) -> StoreResult<Author>;

    async fn authors(&self) -> StoreResult<Vec<Author>>;

    /// Insert a book. Fails with `MissingAuthor` if `author_id` is unknown.
    async fn create_book(&self, book: NewBook) -> StoreResult<Book>;

    async fn book(&self, id: i64) -> StoreResult<Option<Book>>;

    /// Overwrite name, isbn and author of an existing book.
    async fn update_book(&self, id: i64, book: NewBook) -> StoreResult<Book>;

    async fn books(&self) -> StoreResult<Vec<Book>>;

    /// Apply schema migrations not applied yet, returning how many ran.
    async fn migrate(&self, _migrations: &[(String, Migration)]) -> StoreResult<usize> {
        Ok(0)
    }
}
