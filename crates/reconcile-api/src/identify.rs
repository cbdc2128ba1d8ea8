//! Handler for `POST /identify`.
//!
//! Body: `{"email"?: string, "phoneNumber"?: string | number}`. Either field
//! may be omitted or `null`, but not both.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use reconcile_core::{
  cancel::Cancellation,
  request::IdentifyRequest,
  store::ContactStore,
  view::ConsolidatedContact,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{AppState, error::ApiError};

// ─── Body ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  #[serde(default)]
  pub email:        Option<String>,
  /// Clients commonly send phone numbers as bare JSON numbers.
  #[serde(default, deserialize_with = "string_or_number")]
  pub phone_number: Option<String>,
}

fn string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(serde_json::Number),
  }

  Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
    Raw::Text(s) => s,
    Raw::Number(n) => n.to_string(),
  }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedContact,
}

// ─── Handler ──────────────────────────────────────────────────────────────────

/// `POST /identify`: returns the consolidated view of the caller's cluster.
///
/// A request without a JSON content type is read as an empty body, so it
/// fails validation like `{}` does.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<IdentifyBody>, JsonRejection>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let body = match body {
    Ok(Json(body)) => body,
    Err(JsonRejection::MissingJsonContentType(_)) => IdentifyBody::default(),
    Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
  };

  tracing::debug!(
    email = ?body.email,
    phone_number = ?body.phone_number,
    "identify request"
  );

  let request = IdentifyRequest::new(body.email, body.phone_number)?;

  let cancel = Cancellation::new();
  let call = state.store.identify(request, cancel.clone());
  tokio::pin!(call);

  let outcome = match tokio::time::timeout(state.store_timeout, &mut call).await
  {
    Ok(outcome) => outcome,
    Err(_) if cancel.cancel() => {
      return Err(ApiError::Timeout(state.store_timeout));
    }
    // The store is already committing; report what it actually did.
    Err(_) => call.await,
  };
  let contact = outcome.map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(IdentifyResponse { contact }))
}
