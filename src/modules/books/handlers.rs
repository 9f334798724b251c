//! Resource handlers, generic over the [`Serializer`] they are registered with.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use bookshelf_db::Store;
use bookshelf_http::{AppError, Success};
use serde_json::Value;

use super::serializers::Serializer;

type Payload = Result<Json<Value>, JsonRejection>;

/// `GET /{plural}/`
pub async fn list<S: Serializer>(
    State(store): State<Arc<dyn Store>>,
) -> Result<Success<Vec<S::Repr>>, AppError> {
    let records = S::list(store.as_ref()).await?;
    let data = records.iter().map(S::render).collect();
    Ok(Success::ok(format!("{} retrieved!", S::PLURAL), data))
}

/// `GET /{name}/{id}/`
pub async fn retrieve<S: Serializer>(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<String>,
) -> Result<Success<S::Repr>, AppError> {
    let record = find::<S>(store.as_ref(), &id).await?;
    Ok(Success::ok(format!("{} retrieved!", S::NAME), S::render(&record)))
}

/// `POST /{name}/`
pub async fn create<S: Serializer>(
    State(store): State<Arc<dyn Store>>,
    payload: Payload,
) -> Result<Success<S::Repr>, AppError> {
    let data = S::validate(&body(payload)?)?;
    let record = S::create(store.as_ref(), data).await?;
    tracing::debug!(resource = S::NAME, "resource created");
    Ok(Success::created(format!("{} created!", S::NAME), S::render(&record)))
}

/// `PUT /{name}/{id}/`
///
/// An unknown id is reported before the body is looked at.
pub async fn update<S: Serializer>(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Success<S::Repr>, AppError> {
    let existing = find::<S>(store.as_ref(), &id).await?;
    let data = S::validate(&body(payload)?)?;
    let record = S::update(store.as_ref(), existing, data).await?;
    Ok(Success::ok(format!("{} updated!", S::NAME), S::render(&record)))
}

/// Non-numeric ids cannot match a row, so they get the same 404.
async fn find<S: Serializer>(store: &dyn Store, id: &str) -> Result<S::Record, AppError> {
    let missing = || AppError::not_found(format!("{} does not exist!", S::NAME));
    let Ok(id) = id.parse::<i64>() else {
        return Err(missing());
    };
    S::retrieve(store, id).await?.ok_or_else(missing)
}

fn body(payload: Payload) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}
