//! [`SqliteStore`]: the SQLite implementation of [`ContactStore`].

use std::path::Path;

use rusqlite::TransactionBehavior;

use reconcile_core::{
  cancel::Cancellation,
  contact::{Contact, ContactId},
  ledger::ContactLedger as _,
  linker,
  request::IdentifyRequest,
  store::ContactStore,
  view::ConsolidatedContact,
};

use crate::{Result, ledger::SqliteLedger, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A reconciliation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection, so calls are also serialised on its worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Every contact in the store, oldest first.
  #[cfg(test)]
  pub(crate) async fn all_contacts(&self) -> Result<Vec<Contact>> {
    self.read(|ledger| ledger.all()).await
  }

  /// Run a read-only closure against a ledger on the worker thread.
  pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut SqliteLedger<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(f(&mut SqliteLedger::new(conn))))
      .await?
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = crate::Error;

  async fn identify(
    &self,
    request: IdentifyRequest,
    cancel: Cancellation,
  ) -> Result<ConsolidatedContact> {
    let outcome = self
      .conn
      .call(move |conn| {
        if cancel.is_cancelled() {
          return Ok(Err(reconcile_core::Error::Cancelled));
        }
        // IMMEDIATE takes the write lock up front, so the match-read and the
        // conditional write cannot interleave with another identify call.
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome =
          linker::identify(&mut SqliteLedger::new(&tx), &request).and_then(
            |view| {
              if cancel.claim_commit() {
                Ok(view)
              } else {
                Err(reconcile_core::Error::Cancelled)
              }
            },
          );
        if outcome.is_ok() {
          tx.commit()?;
        }
        // Dropping `tx` uncommitted rolls everything back.
        Ok(outcome)
      })
      .await?;

    if let Err(e) = &outcome {
      tracing::warn!(error = %e, "identify rolled back");
    }
    Ok(outcome?)
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self.read(move |ledger| ledger.get(id)).await
  }

  async fn cluster(&self, primary_id: ContactId) -> Result<Vec<Contact>> {
    self
      .read(move |ledger| ledger.find_by_linked_id_or_id(primary_id))
      .await
  }
}
