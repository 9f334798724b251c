use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error::{StoreError, StoreResult};
use crate::migrate::{self, Migration};
use crate::models::{Author, Book, NewAuthor, NewBook};
use crate::store::Store;

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.name, b.isbn, a.id AS author_id, a.first_name, a.last_name
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

/// SQLite-backed store using the `authors` and `books` tables.
///
/// The tables are created by the owning module's migrations, applied
/// through [`Store::migrate`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a pool for `url`. In-memory databases are pinned to one
    /// connection so every query sees the same database.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if in_memory {
            // Closing the last connection drops an in-memory database.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;

        Ok(Self { pool })
    }
}

fn author_from_row(row: &SqliteRow) -> StoreResult<Author> {
    Ok(Author {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
    })
}

fn book_from_row(row: &SqliteRow) -> StoreResult<Book> {
    Ok(Book {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        isbn: row.try_get("isbn")?,
        author: Author {
            id: row.try_get("author_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
        },
    })
}

async fn find_author_in(
    conn: &mut SqliteConnection,
    first_name: &str,
    last_name: &str,
) -> StoreResult<Option<Author>> {
    let row = sqlx::query(
        "SELECT id, first_name, last_name FROM authors \
         WHERE first_name = ? AND last_name = ? ORDER BY id LIMIT 1",
    )
    .bind(first_name)
    .bind(last_name)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(author_from_row).transpose()
}

async fn insert_author_in(conn: &mut SqliteConnection, author: NewAuthor) -> StoreResult<Author> {
    let result = sqlx::query("INSERT INTO authors (first_name, last_name) VALUES (?, ?)")
        .bind(&author.first_name)
        .bind(&author.last_name)
        .execute(&mut *conn)
        .await?;
    Ok(Author {
        id: result.last_insert_rowid(),
        first_name: author.first_name,
        last_name: author.last_name,
    })
}

async fn ensure_author_in(conn: &mut SqliteConnection, author_id: i64) -> StoreResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM authors WHERE id = ?")
        .bind(author_id)
        .fetch_optional(&mut *conn)
        .await?;
    match exists {
        Some(_) => Ok(()),
        None => Err(StoreError::MissingAuthor(author_id)),
    }
}

async fn book_in(conn: &mut SqliteConnection, id: i64) -> StoreResult<Option<Book>> {
    let row = sqlx::query(&format!("{BOOK_SELECT} WHERE b.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(book_from_row).transpose()
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        let mut conn = self.pool.acquire().await?;
        insert_author_in(&mut conn, author).await
    }

    async fn author(&self, id: i64) -> StoreResult<Option<Author>> {
        let row = sqlx::query("SELECT id, first_name, last_name FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(author_from_row).transpose()
    }

    async fn find_author(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<Option<Author>> {
        let mut conn = self.pool.acquire().await?;
        find_author_in(&mut conn, first_name, last_name).await
    }

    async fn update_author(&self, author: &Author) -> StoreResult<Author> {
        let result = sqlx::query("UPDATE authors SET first_name = ?, last_name = ? WHERE id = ?")
            .bind(&author.first_name)
            .bind(&author.last_name)
            .bind(author.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow {
                table: "authors",
                id: author.id,
            });
        }
        Ok(author.clone())
    }

    async fn authors(&self) -> StoreResult<Vec<Author>> {
        let rows = sqlx::query("SELECT id, first_name, last_name FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(author_from_row).collect()
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        let mut tx = self.pool.begin().await?;
        ensure_author_in(&mut tx, book.author_id).await?;
        let result = sqlx::query("INSERT INTO books (name, isbn, author_id) VALUES (?, ?, ?)")
            .bind(&book.name)
            .bind(&book.isbn)
            .bind(book.author_id)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();
        let created = book_in(&mut tx, id)
            .await?
            .ok_or(StoreError::MissingRow { table: "books", id })?;
        tx.commit().await?;
        Ok(created)
    }

    async fn book(&self, id: i64) -> StoreResult<Option<Book>> {
        let mut conn = self.pool.acquire().await?;
        book_in(&mut conn, id).await
    }

    async fn update_book(&self, id: i64, book: NewBook) -> StoreResult<Book> {
        let mut tx = self.pool.begin().await?;
        ensure_author_in(&mut tx, book.author_id).await?;
        let result = sqlx::query("UPDATE books SET name = ?, isbn = ?, author_id = ? WHERE id = ?")
            .bind(&book.name)
            .bind(&book.isbn)
            .bind(book.author_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow { table: "books", id });
        }
        let updated = book_in(&mut tx, id)
            .await?
            .ok_or(StoreError::MissingRow { table: "books", id })?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn books(&self) -> StoreResult<Vec<Book>> {
        let rows = sqlx::query(&format!("{BOOK_SELECT} ORDER BY b.id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn migrate(&self, migrations: &[(String, Migration)]) -> StoreResult<usize> {
        migrate::run(&self.pool, migrations).await
    }
}
