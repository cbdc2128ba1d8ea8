//! Error types for `reconcile-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The caller supplied neither an email nor a phone number.
  #[error("Either email or phoneNumber is required")]
  MissingContactFact,

  /// The caller gave up before the unit of work committed; nothing was kept.
  #[error("identify was cancelled before commit")]
  Cancelled,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error raised while the linker was talking to a ledger.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// `true` if the error was caused by caller input rather than the store.
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::MissingContactFact)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
