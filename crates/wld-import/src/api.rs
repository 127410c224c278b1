//! Read-only JSON status endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/status/{id}` | 404 if no such run |
//! | `GET`  | `/files` | Registered source files with their counts |

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::get,
};
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use wld_core::{
  catalog::{Catalog, SourceFile},
  model::Pk,
  status::RunStatus,
};

/// An error returned by a status handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// Build the status router over `catalog`.
pub fn status_router<C>(catalog: Arc<C>) -> Router<()>
where
  C: Catalog + 'static,
{
  Router::new()
    .route("/status/{id}", get(status::<C>))
    .route("/files", get(files::<C>))
    .layer(TraceLayer::new_for_http())
    .with_state(catalog)
}

/// `GET /status/{id}`
async fn status<C: Catalog>(
  State(catalog): State<Arc<C>>,
  Path(id): Path<i64>,
) -> Result<Json<RunStatus>, ApiError> {
  catalog
    .get_status(Pk(id))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("run {id}")))
}

/// `GET /files`
async fn files<C: Catalog>(
  State(catalog): State<Arc<C>>,
) -> Result<Json<Vec<SourceFile>>, ApiError> {
  let files = catalog
    .source_files()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(files))
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use tower::ServiceExt as _;
  use wld_core::{key::{IssueKey, ResolverConfig}, status::Method};
  use wld_store_sqlite::SqliteStore;

  use super::*;

  async fn catalog() -> Arc<SqliteStore> {
    Arc::new(
      SqliteStore::open_in_memory(ResolverConfig::default())
        .await
        .unwrap(),
    )
  }

  async fn get_json(
    catalog: Arc<SqliteStore>,
    uri: &str,
  ) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = status_router(catalog).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn status_is_served_as_json() {
    let catalog = catalog().await;
    let run = catalog.create_status(Method::Staged).await.unwrap();

    let (code, body) = get_json(catalog, &format!("/status/{}", run.id)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["method"], "staged");
    assert_eq!(body["status"], "idle");
    assert_eq!(body["read"], 0);
  }

  #[tokio::test]
  async fn unknown_run_is_404() {
    let (code, body) = get_json(catalog().await, "/status/42").await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "run 42");
  }

  #[tokio::test]
  async fn files_lists_registrations() {
    let catalog = catalog().await;
    catalog
      .register_source_file(IssueKey::new(2, None, 5), "d2a5.tsv".into())
      .await
      .unwrap();

    let (code, body) = get_json(catalog, "/files").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["key"]["part"], 2);
    assert_eq!(body[0]["processed"], serde_json::Value::Null);
  }
}
