//! Error types for `terra-core`.
//!
//! These are the business-rule failures every backend reports in the same
//! shape, so the API layer can map them to status codes without knowing
//! which store produced them.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A required field is missing or blank.
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  /// The entity exists but is in the wrong lifecycle state for the request.
  #[error("{0}")]
  InvalidState(String),

  /// A referential guard refused the operation.
  #[error("{0}")]
  Conflict(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types that may carry a domain [`Error`].
pub trait AsDomainError {
  fn as_domain(&self) -> Option<&Error>;
}

impl AsDomainError for Error {
  fn as_domain(&self) -> Option<&Error> { Some(self) }
}

/// Reject a missing or whitespace-only required text field.
pub fn require_text(value: Option<&str>, field: &str) -> Result<()> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(()),
    _ => Err(Error::Validation(format!("the field `{field}` is required"))),
  }
}
