use bookshelf_db::{Author, Book, NewAuthor};
use serde::{Deserialize, Serialize};

/// Validated author fields from a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorPayload {
    pub first_name: String,
    pub last_name: String,
}

impl From<AuthorPayload> for NewAuthor {
    fn from(payload: AuthorPayload) -> Self {
        NewAuthor::new(payload.first_name, payload.last_name)
    }
}

/// Validated book fields from a request body, with the nested author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPayload {
    pub name: String,
    pub isbn: String,
    pub author: AuthorPayload,
}

/// Author as rendered in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRepr {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Author> for AuthorRepr {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        }
    }
}

/// Book as rendered in responses. The author is always embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRepr {
    pub id: i64,
    pub name: String,
    pub isbn: String,
    pub author: AuthorRepr,
}

impl From<&Book> for BookRepr {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            name: book.name.clone(),
            isbn: book.isbn.clone(),
            author: AuthorRepr::from(&book.author),
        }
    }
}
