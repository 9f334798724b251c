pub mod handlers;
pub mod models;
pub mod serializers;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use serializers::{AuthorSerializer, BookSerializer};

/// Books module: authors and books with nested author reconciliation
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    fn mount_path(&self) -> String {
        "/".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = %ctx.settings.database.endpoint,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        Router::new()
            .route("/books/", get(handlers::list::<BookSerializer>))
            .route("/book/", post(handlers::create::<BookSerializer>))
            .route(
                "/book/{id}/",
                get(handlers::retrieve::<BookSerializer>).put(handlers::update::<BookSerializer>),
            )
            .route("/authors/", get(handlers::list::<AuthorSerializer>))
            .route("/author/", post(handlers::create::<AuthorSerializer>))
            .route(
                "/author/{id}/",
                get(handlers::retrieve::<AuthorSerializer>)
                    .put(handlers::update::<AuthorSerializer>),
            )
            .with_state(ctx.db.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_authors",
                up: r#"
                    CREATE TABLE IF NOT EXISTS authors (
                        id         INTEGER PRIMARY KEY AUTOINCREMENT,
                        first_name TEXT NOT NULL,
                        last_name  TEXT NOT NULL
                    );
                    CREATE INDEX IF NOT EXISTS authors_natural_key
                        ON authors (first_name, last_name);
                    "#,
            },
            Migration {
                id: "002_books",
                up: r#"
                    CREATE TABLE IF NOT EXISTS books (
                        id        INTEGER PRIMARY KEY AUTOINCREMENT,
                        name      TEXT NOT NULL,
                        isbn      TEXT NOT NULL,
                        author_id INTEGER NOT NULL
                            REFERENCES authors (id) ON DELETE CASCADE
                    );
                    CREATE INDEX IF NOT EXISTS books_author_id ON books (author_id);
                    "#,
            },
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn envelope_of(data: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "status": { "type": "boolean" },
            "message": { "type": "string" },
            "data": data
        },
        "required": ["status", "message", "data"]
    })
}

fn error_response(description: &str) -> serde_json::Value {
    json_response(description, json!({ "$ref": "#/components/schemas/ErrorResponse" }))
}

/// Paths for one resource: list, create, retrieve and update.
fn resource_paths(
    name: &str,
    plural: &str,
    tag: &str,
    schema: &str,
    input: &str,
) -> serde_json::Value {
    let one = json!({ "$ref": format!("#/components/schemas/{schema}") });
    let many = json!({ "type": "array", "items": one.clone() });
    let body = json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{input}") }
            }
        }
    });
    let id_param = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    }]);

    json!({
        format!("/{plural}/"): {
            "get": {
                "summary": format!("List {plural}"),
                "tags": [tag],
                "responses": {
                    "200": json_response(&format!("All {plural}"), envelope_of(many))
                }
            }
        },
        format!("/{name}/"): {
            "post": {
                "summary": format!("Create a {name}"),
                "tags": [tag],
                "requestBody": body.clone(),
                "responses": {
                    "201": json_response(&format!("Created {name}"), envelope_of(one.clone())),
                    "400": error_response("Invalid body")
                }
            }
        },
        format!("/{name}/{{id}}/"): {
            "get": {
                "summary": format!("Get a {name} by id"),
                "tags": [tag],
                "parameters": id_param.clone(),
                "responses": {
                    "200": json_response(&format!("The {name}"), envelope_of(one.clone())),
                    "404": error_response("Unknown id")
                }
            },
            "put": {
                "summary": format!("Update a {name} by id"),
                "tags": [tag],
                "parameters": id_param,
                "requestBody": body,
                "responses": {
                    "200": json_response(&format!("Updated {name}"), envelope_of(one)),
                    "400": error_response("Invalid body"),
                    "404": error_response("Unknown id")
                }
            }
        }
    })
}

fn openapi() -> serde_json::Value {
    let mut paths = resource_paths("book", "books", "Books", "Book", "BookInput");
    if let (Some(books), serde_json::Value::Object(authors)) = (
        paths.as_object_mut(),
        resource_paths("author", "authors", "Authors", "Author", "AuthorInput"),
    ) {
        books.extend(authors);
    }

    let text = |description: &str| json!({ "type": "string", "minLength": 1, "description": description });

    json!({
        "paths": paths,
        "components": {
            "schemas": {
                "Author": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "first_name": { "type": "string" },
                        "last_name": { "type": "string" }
                    },
                    "required": ["id", "first_name", "last_name"]
                },
                "AuthorInput": {
                    "type": "object",
                    "properties": {
                        "first_name": text("Author first name"),
                        "last_name": text("Author last name")
                    },
                    "required": ["first_name", "last_name"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" },
                        "isbn": { "type": "string" },
                        "author": { "$ref": "#/components/schemas/Author" }
                    },
                    "required": ["id", "name", "isbn", "author"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "name": text("Book title"),
                        "isbn": text("ISBN, not checksummed"),
                        "author": {
                            "$ref": "#/components/schemas/AuthorInput",
                            "description": "Reused when an author with exactly these names exists, created otherwise"
                        }
                    },
                    "required": ["name", "isbn", "author"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
