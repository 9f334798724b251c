use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bookshelf_app::books::models::{AuthorRepr, BookRepr};
use bookshelf_db::{MemoryStore, NewAuthor, NewBook, Store};
use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::InitCtx;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let settings = Settings::default();
        let registry = bookshelf_app::registry().unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: store.clone(),
        };
        let router = bookshelf_http::build_router(&registry, &ctx);
        Self { router, store }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    async fn author(&self, first_name: &str, last_name: &str) -> bookshelf_db::Author {
        self.store
            .create_author(NewAuthor::new(first_name, last_name))
            .await
            .unwrap()
    }

    async fn book(&self, name: &str, isbn: &str, author_id: i64) -> bookshelf_db::Book {
        self.store
            .create_book(NewBook {
                name: name.to_string(),
                isbn: isbn.to_string(),
                author_id,
            })
            .await
            .unwrap()
    }
}

fn valid_book_payload() -> Value {
    json!({
        "name": "Pythonic Code",
        "isbn": "2738294838",
        "author": {"first_name": "John", "last_name": "Doe"}
    })
}

#[tokio::test]
async fn list_books_returns_store_order() {
    let app = TestApp::new();
    let one = app.author("Jane", "Doe").await;
    let two = app.author("Flutter", "Wave").await;
    let three = app.author("Waje", "Solutions").await;
    app.book("Glitch", "1256841190", one.id).await;
    app.book("Software Architectural Patterns", "3433549941", three.id).await;
    app.book("Clean Code", "0875754570", two.id).await;

    let (status, body) = app.get("/books/").await;

    assert_eq!(status, StatusCode::OK);
    let expected: Vec<BookRepr> = app
        .store
        .books()
        .await
        .unwrap()
        .iter()
        .map(BookRepr::from)
        .collect();
    assert_eq!(
        body,
        json!({"status": true, "message": "Books retrieved!", "data": expected})
    );
    assert_eq!(body["data"][1]["author"]["first_name"], "Waje");
}

#[tokio::test]
async fn get_book_is_idempotent() {
    let app = TestApp::new();
    let author = app.author("John", "Doe").await;
    let book = app.book("Return of Glitch X", "1256841190", author.id).await;
    let uri = format!("/book/{}/", book.id);

    let (status, first) = app.get(&uri).await;
    let (_, second) = app.get(&uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(
        first,
        json!({
            "status": true,
            "message": "Book retrieved!",
            "data": {
                "id": book.id,
                "name": "Return of Glitch X",
                "isbn": "1256841190",
                "author": {"id": author.id, "first_name": "John", "last_name": "Doe"}
            }
        })
    );
}

#[tokio::test]
async fn get_unknown_book_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/book/53/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": false, "message": "Book does not exist!"}));

    let (status, _) = app.get("/book/not-a-number/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_book_reuses_existing_author() {
    let app = TestApp::new();
    let author = app.author("John", "Doe").await;
    app.book("Return of Glitch X", "1256841190", author.id).await;

    let (status, body) = app.post("/book/", valid_book_payload()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "Book created!");
    assert_eq!(body["data"]["name"], "Pythonic Code");
    assert_eq!(
        serde_json::from_value::<AuthorRepr>(body["data"]["author"].clone()).unwrap(),
        AuthorRepr::from(&author)
    );
    assert_eq!(app.store.authors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_book_with_new_author_capitalizes_names() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/book/",
            json!({
                "name": "Glitch",
                "isbn": "2738534838",
                "author": {"first_name": "victor", "last_name": "martin"}
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["author"]["first_name"], "Victor");
    assert_eq!(body["data"]["author"]["last_name"], "Martin");

    let authors = app.store.authors().await.unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(body["data"]["author"]["id"], authors[0].id);
}

#[tokio::test]
async fn create_book_with_differently_cased_author_adds_one() {
    let app = TestApp::new();
    let john = app.author("John", "Doe").await;

    let (status, body) = app
        .post(
            "/book/",
            json!({
                "name": "Pythonic Code",
                "isbn": "2738294838",
                "author": {"first_name": "john", "last_name": "doe"}
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["data"]["author"]["id"], john.id);
    assert_eq!(body["data"]["author"]["first_name"], "John");
    assert_eq!(body["data"]["author"]["last_name"], "Doe");
    assert_eq!(app.store.authors().await.unwrap().len(), 2);
}

#[tokio::test]
async fn create_invalid_book_reports_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/book/",
            json!({
                "name": "",
                "isbn": "0875754570",
                "author": {"first_name": "Doe", "last_name": ""}
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "status": false,
            "message": {
                "name": ["This field may not be blank."],
                "author": {"last_name": ["This field may not be blank."]}
            }
        })
    );
    assert!(app.store.books().await.unwrap().is_empty());
    assert!(app.store.authors().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/author/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"first_name\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_book_with_valid_payload() {
    let app = TestApp::new();
    let author = app.author("John", "Doe").await;
    let book = app.book("Return of Glitch X", "1256841190", author.id).await;

    let (status, body) = app
        .put(
            &format!("/book/{}/", book.id),
            json!({
                "name": "Glitch",
                "isbn": "2738534838",
                "author": {"first_name": "Victor", "last_name": "Martin"}
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book updated!");
    assert_eq!(body["data"]["id"], book.id);
    assert_eq!(body["data"]["name"], "Glitch");
    assert_eq!(body["data"]["author"]["first_name"], "Victor");

    let stored = app.store.book(book.id).await.unwrap().unwrap();
    assert_eq!(stored.isbn, "2738534838");
    assert_eq!(stored.author.last_name, "Martin");
}

#[tokio::test]
async fn update_book_with_invalid_payload() {
    let app = TestApp::new();
    let author = app.author("John", "Doe").await;
    let book = app.book("Return of Glitch X", "1256841190", author.id).await;

    let (status, body) = app
        .put(
            &format!("/book/{}/", book.id),
            json!({
                "name": "",
                "isbn": "2738534838",
                "author": {"first_name": "Victor", "last_name": 456}
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"]["author"]["last_name"][0], "Not a valid string.");
    assert_eq!(app.store.book(book.id).await.unwrap().unwrap(), book);
}

#[tokio::test]
async fn update_unknown_ids_are_not_found_regardless_of_body() {
    let app = TestApp::new();

    let (status, _) = app.put("/book/53/", valid_book_payload()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.put("/book/53/", json!({"name": ""})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .put("/author/53/", json!({"first_name": "Qazi", "last_name": "Doe"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": false, "message": "Author does not exist!"}));

    let (status, _) = app.put("/author/53/", json!([])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_authors() {
    let app = TestApp::new();
    app.author("Jane", "Doe").await;
    app.author("Flutter", "Wave").await;
    app.author("Waje", "Solutions").await;

    let (status, body) = app.get("/authors/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Authors retrieved!");
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["first_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Jane", "Flutter", "Waje"]);
}

#[tokio::test]
async fn get_author() {
    let app = TestApp::new();
    let author = app.author("John", "Doe").await;

    let (status, body) = app.get(&format!("/author/{}/", author.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": true,
            "message": "Author retrieved!",
            "data": {"id": author.id, "first_name": "John", "last_name": "Doe"}
        })
    );

    let (status, _) = app.get("/author/53/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_author_stores_names_verbatim() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/author/", json!({"first_name": "Clever", "last_name": "programmer"}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Author created!");
    assert_eq!(body["data"]["last_name"], "programmer");
    assert_eq!(app.store.authors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_invalid_author() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/author/", json!({"first_name": "", "last_name": 37384947584u64}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!({
            "first_name": ["This field may not be blank."],
            "last_name": ["Not a valid string."]
        })
    );
}

#[tokio::test]
async fn update_author() {
    let app = TestApp::new();
    let author = app.author("John", "Doe").await;
    let uri = format!("/author/{}/", author.id);

    let (status, body) = app
        .put(&uri, json!({"first_name": "Qazi", "last_name": "Doe"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Qazi");

    let (status, _) = app
        .put(&uri, json!({"first_name": "", "last_name": 37384947584u64}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        app.store.author(author.id).await.unwrap().unwrap().first_name,
        "Qazi"
    );
}

#[tokio::test]
async fn resources_are_served_at_the_root() {
    let app = TestApp::new();

    for path in ["/books/", "/authors/"] {
        let (status, _) = app.get(path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
    }

    let (status, _) = app.get("/api/books/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let app = TestApp::new();

    let (status, body) = app.get("/shelves/").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": false, "message": "Not found."}));
}
