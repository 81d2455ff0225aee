//! Error type for `terra-store-sqlite`.

use terra_core::AsDomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A business rule rejected the operation; the transaction was rolled
  /// back.
  #[error(transparent)]
  Core(#[from] terra_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  #[error("unknown territory status: {0:?}")]
  UnknownStatus(String),
}

impl AsDomainError for Error {
  fn as_domain(&self) -> Option<&terra_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
