//! Serializers: validate request bodies, persist through the store, and
//! render records for responses.

use async_trait::async_trait;
use bookshelf_db::{Author, Book, NewAuthor, NewBook, Store, StoreResult};
use bookshelf_http::{Fields, ValidationErrors};
use serde::Serialize;
use serde_json::Value;

use super::models::{AuthorPayload, AuthorRepr, BookPayload, BookRepr};
use crate::utils::capitalize;

/// Strategy a resource handler is parameterized with.
#[async_trait]
pub trait Serializer: Send + Sync + 'static {
    type Record: Send + 'static;
    type Data: Send + 'static;
    type Repr: Serialize + Send + 'static;

    /// Resource name used in response messages, e.g. `Book`.
    const NAME: &'static str;
    const PLURAL: &'static str;

    fn validate(payload: &Value) -> Result<Self::Data, ValidationErrors>;

    fn render(record: &Self::Record) -> Self::Repr;

    async fn retrieve(store: &dyn Store, id: i64) -> StoreResult<Option<Self::Record>>;

    async fn list(store: &dyn Store) -> StoreResult<Vec<Self::Record>>;

    async fn create(store: &dyn Store, data: Self::Data) -> StoreResult<Self::Record>;

    async fn update(
        store: &dyn Store,
        existing: Self::Record,
        data: Self::Data,
    ) -> StoreResult<Self::Record>;
}

pub struct AuthorSerializer;

impl AuthorSerializer {
    fn validate_fields(payload: &Value) -> Result<AuthorPayload, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let first_name = fields.text("first_name");
        let last_name = fields.text("last_name");
        fields.finish(|| {
            Some(AuthorPayload {
                first_name: first_name?,
                last_name: last_name?,
            })
        })
    }
}

#[async_trait]
impl Serializer for AuthorSerializer {
    type Record = Author;
    type Data = AuthorPayload;
    type Repr = AuthorRepr;

    const NAME: &'static str = "Author";
    const PLURAL: &'static str = "Authors";

    fn validate(payload: &Value) -> Result<AuthorPayload, ValidationErrors> {
        Self::validate_fields(payload)
    }

    fn render(record: &Author) -> AuthorRepr {
        AuthorRepr::from(record)
    }

    async fn retrieve(store: &dyn Store, id: i64) -> StoreResult<Option<Author>> {
        store.author(id).await
    }

    async fn list(store: &dyn Store) -> StoreResult<Vec<Author>> {
        store.authors().await
    }

    async fn create(store: &dyn Store, data: AuthorPayload) -> StoreResult<Author> {
        store.create_author(data.into()).await
    }

    async fn update(store: &dyn Store, existing: Author, data: AuthorPayload) -> StoreResult<Author> {
        let author = Author {
            first_name: data.first_name,
            last_name: data.last_name,
            ..existing
        };
        store.update_author(&author).await
    }
}

pub struct BookSerializer;

impl BookSerializer {
    /// Resolve the nested author of a book write.
    ///
    /// An exact match on the submitted names is reused as-is. Otherwise a
    /// new author is created with both names capitalized. Store errors from
    /// the lookup propagate; only a miss creates a row.
    pub async fn resolve_author(store: &dyn Store, author: AuthorPayload) -> StoreResult<Author> {
        if let Some(existing) = store
            .find_author(&author.first_name, &author.last_name)
            .await?
        {
            return Ok(existing);
        }

        let created = store
            .create_author(NewAuthor::new(
                capitalize(&author.first_name),
                capitalize(&author.last_name),
            ))
            .await?;
        tracing::info!(
            author_id = created.id,
            first_name = %created.first_name,
            last_name = %created.last_name,
            "author created from book payload"
        );
        Ok(created)
    }
}

#[async_trait]
impl Serializer for BookSerializer {
    type Record = Book;
    type Data = BookPayload;
    type Repr = BookRepr;

    const NAME: &'static str = "Book";
    const PLURAL: &'static str = "Books";

    fn validate(payload: &Value) -> Result<BookPayload, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let name = fields.text("name");
        let isbn = fields.text("isbn");
        let author = fields.nested("author", AuthorSerializer::validate_fields);
        fields.finish(|| {
            Some(BookPayload {
                name: name?,
                isbn: isbn?,
                author: author?,
            })
        })
    }

    fn render(record: &Book) -> BookRepr {
        BookRepr::from(record)
    }

    async fn retrieve(store: &dyn Store, id: i64) -> StoreResult<Option<Book>> {
        store.book(id).await
    }

    async fn list(store: &dyn Store) -> StoreResult<Vec<Book>> {
        store.books().await
    }

    async fn create(store: &dyn Store, data: BookPayload) -> StoreResult<Book> {
        let author = Self::resolve_author(store, data.author).await?;
        store
            .create_book(NewBook {
                name: data.name,
                isbn: data.isbn,
                author_id: author.id,
            })
            .await
    }

    async fn update(store: &dyn Store, existing: Book, data: BookPayload) -> StoreResult<Book> {
        let author = Self::resolve_author(store, data.author).await?;
        store
            .update_book(
                existing.id,
                NewBook {
                    name: data.name,
                    isbn: data.isbn,
                    author_id: author.id,
                },
            )
            .await
    }
}
