//! The `ContactStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `reconcile-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::{
  cancel::Cancellation,
  contact::{Contact, ContactId},
  request::IdentifyRequest,
  view::ConsolidatedContact,
};

/// Abstraction over a shared reconciliation store.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run [`crate::linker::identify`] as one atomic unit of work and return the
  /// consolidated view of the caller's cluster.
  ///
  /// Nothing written during a failed call is visible afterwards. If `cancel`
  /// is cancelled before the store claims the commit, the call fails with
  /// [`crate::Error::Cancelled`] and leaves no trace, even when the work
  /// itself has already run.
  fn identify(
    &self,
    request: IdentifyRequest,
    cancel: Cancellation,
  ) -> impl Future<Output = Result<ConsolidatedContact, Self::Error>> + Send + '_;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// The contact `primary_id` plus every contact linked to it, oldest first.
  fn cluster(
    &self,
    primary_id: ContactId,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;
}
