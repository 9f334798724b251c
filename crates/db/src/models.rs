//! Records as they are stored.

/// A stored author row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Fields needed to insert an author. Also the natural key used for lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
}

impl NewAuthor {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// A stored book joined with its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub isbn: String,
    pub author: Author,
}

/// Column values for inserting or overwriting a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub name: String,
    pub isbn: String,
    pub author_id: i64,
}
