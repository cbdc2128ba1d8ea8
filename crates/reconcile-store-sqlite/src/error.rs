//! Error type for `reconcile-store-sqlite`.

use reconcile_core::contact::ContactId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] reconcile_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown link precedence: {0:?}")]
  UnknownPrecedence(String),

  /// Attempted to update a contact that does not exist.
  #[error("contact not found: {0}")]
  ContactNotFound(ContactId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
