//! Handler for `GET /contacts/{id}`.
//!
//! Read-only lookup of the cluster a stored contact belongs to. Answers with
//! the same consolidated shape as `POST /identify` but never writes.

use axum::{
  Json,
  extract::{Path, State},
};
use reconcile_core::{
  contact::ContactId,
  store::ContactStore,
  view::ConsolidatedContact,
};

use crate::{AppState, error::ApiError, identify::IdentifyResponse};

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<ContactId>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = bounded(&state, state.store.get_contact(id))
    .await?
    .ok_or(ApiError::NotFound(id))?;

  let primary_id = contact.linked_id.unwrap_or(contact.id);
  let members = bounded(&state, state.store.cluster(primary_id)).await?;
  let primary = members
    .iter()
    .find(|c| c.id == primary_id)
    .unwrap_or(&contact);

  Ok(Json(IdentifyResponse {
    contact: ConsolidatedContact::from_cluster(primary, &members),
  }))
}

/// Apply the store timeout to a read. Reads have nothing to roll back.
async fn bounded<S, T>(
  state: &AppState<S>,
  call: impl Future<Output = Result<T, S::Error>>,
) -> Result<T, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  tokio::time::timeout(state.store_timeout, call)
    .await
    .map_err(|_| ApiError::Timeout(state.store_timeout))?
    .map_err(|e| ApiError::Store(Box::new(e)))
}
