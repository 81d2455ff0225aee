//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use terra_core::AsDomainError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error it carries, if any.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + AsDomainError + Send + Sync + 'static,
  {
    match e.as_domain() {
      Some(domain) => domain.clone().into(),
      None => ApiError::Store(Box::new(e)),
    }
  }

  pub fn internal<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Store(Box::new(e))
  }
}

impl From<terra_core::Error> for ApiError {
  fn from(e: terra_core::Error) -> Self {
    use terra_core::Error as E;
    match e {
      E::NotFound(m) => ApiError::NotFound(m),
      E::Validation(m) | E::InvalidState(m) | E::Conflict(m) => ApiError::BadRequest(m),
    }
  }
}

/// Message sent to clients in place of a server-side failure's detail.
const INTERNAL_MESSAGE: &str = "Erro interno do servidor.";

// Malformed bodies, ids and query strings are client errors, whatever
// status axum would pick for the rejection.
impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(e: PathRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(e: QueryRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        return (status, Json(json!({ "error": INTERNAL_MESSAGE }))).into_response();
      }
    };
    tracing::warn!(error = %message, status = status.as_u16(), "request rejected");
    (status, Json(json!({ "error": message }))).into_response()
  }
}
