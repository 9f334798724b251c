use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::models::{Author, Book, NewAuthor, NewBook};
use crate::store::Store;

#[derive(Debug, Clone)]
struct BookRow {
    name: String,
    isbn: String,
    author_id: i64,
}

#[derive(Debug, Default)]
struct Tables {
    authors: BTreeMap<i64, NewAuthor>,
    books: BTreeMap<i64, BookRow>,
    last_author_id: i64,
    last_book_id: i64,
}

impl Tables {
    fn author(&self, id: i64) -> Option<Author> {
        self.authors.get(&id).map(|row| Author {
            id,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
        })
    }

    fn find_author(&self, first_name: &str, last_name: &str) -> Option<Author> {
        // BTreeMap iterates in id order, so the first hit is the lowest id.
        self.authors
            .iter()
            .find(|(_, row)| row.first_name == first_name && row.last_name == last_name)
            .and_then(|(id, _)| self.author(*id))
    }

    fn insert_author(&mut self, author: NewAuthor) -> Author {
        self.last_author_id += 1;
        let id = self.last_author_id;
        let stored = Author {
            id,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        };
        self.authors.insert(id, author);
        stored
    }

    fn book(&self, id: i64) -> StoreResult<Option<Book>> {
        let Some(row) = self.books.get(&id) else {
            return Ok(None);
        };
        let author = self
            .author(row.author_id)
            .ok_or(StoreError::MissingAuthor(row.author_id))?;
        Ok(Some(Book {
            id,
            name: row.name.clone(),
            isbn: row.isbn.clone(),
            author,
        }))
    }

    fn book_row(&self, book: NewBook) -> StoreResult<BookRow> {
        if !self.authors.contains_key(&book.author_id) {
            return Err(StoreError::MissingAuthor(book.author_id));
        }
        Ok(BookRow {
            name: book.name,
            isbn: book.isbn,
            author_id: book.author_id,
        })
    }
}

/// In-memory store.
///
/// Ids start at 1 and are never reused. Each operation takes the table
/// lock once, so a book write sees a consistent author table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        Ok(self.write()?.insert_author(author))
    }

    async fn author(&self, id: i64) -> StoreResult<Option<Author>> {
        Ok(self.read()?.author(id))
    }

    async fn find_author(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<Option<Author>> {
        Ok(self.read()?.find_author(first_name, last_name))
    }

    async fn update_author(&self, author: &Author) -> StoreResult<Author> {
        let mut tables = self.write()?;
        let row = tables
            .authors
            .get_mut(&author.id)
            .ok_or(StoreError::MissingRow {
                table: "authors",
                id: author.id,
            })?;
        row.first_name = author.first_name.clone();
        row.last_name = author.last_name.clone();
        Ok(author.clone())
    }

    async fn authors(&self) -> StoreResult<Vec<Author>> {
        let tables = self.read()?;
        Ok(tables
            .authors
            .keys()
            .filter_map(|id| tables.author(*id))
            .collect())
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        let mut tables = self.write()?;
        let row = tables.book_row(book)?;
        tables.last_book_id += 1;
        let id = tables.last_book_id;
        tables.books.insert(id, row);
        tables
            .book(id)?
            .ok_or(StoreError::MissingRow { table: "books", id })
    }

    async fn book(&self, id: i64) -> StoreResult<Option<Book>> {
        self.read()?.book(id)
    }

    async fn update_book(&self, id: i64, book: NewBook) -> StoreResult<Book> {
        let mut tables = self.write()?;
        if !tables.books.contains_key(&id) {
            return Err(StoreError::MissingRow { table: "books", id });
        }
        let row = tables.book_row(book)?;
        tables.books.insert(id, row);
        tables
            .book(id)?
            .ok_or(StoreError::MissingRow { table: "books", id })
    }

    async fn books(&self) -> StoreResult<Vec<Book>> {
        let tables = self.read()?;
        let mut books = Vec::with_capacity(tables.books.len());
        for id in tables.books.keys() {
            if let Some(book) = tables.book(*id)? {
                books.push(book);
            }
        }
        Ok(books)
    }
}
