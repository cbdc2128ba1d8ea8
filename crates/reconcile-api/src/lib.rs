//! JSON HTTP surface for the identity reconciliation service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`reconcile_core::store::ContactStore`]. TLS and process concerns are the
//! caller's responsibility.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Plain-text liveness string |
//! | `POST` | `/identify` | Body: [`identify::IdentifyBody`] |
//! | `GET`  | `/contacts/{id}` | Consolidated view of the contact's cluster |

pub mod contacts;
pub mod error;
pub mod health;
pub mod identify;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use reconcile_core::store::ContactStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ContactStore> {
  pub store:         Arc<S>,
  /// Upper bound on a single store call; expiry is reported as a 500.
  pub store_timeout: Duration,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the service router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ContactStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(health::handler))
    .route("/identify", post(identify::handler::<S>))
    .route("/contacts/{id}", get(contacts::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::sync::Mutex;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use reconcile_core::{
    cancel::Cancellation,
    contact::{Contact, ContactId},
    request::IdentifyRequest,
    view::ConsolidatedContact,
  };
  use reconcile_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state() -> AppState<SqliteStore> {
    AppState {
      store:         Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      store_timeout: Duration::from_secs(5),
    }
  }

  async fn call<S>(state: AppState<S>, req: Request<Body>) -> (StatusCode, String)
  where
    S: ContactStore + Clone + Send + Sync + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
  {
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  async fn send<S>(
    state: AppState<S>,
    method: &str,
    uri: &str,
    body: &str,
  ) -> (StatusCode, String)
  where
    S: ContactStore + Clone + Send + Sync + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
  {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    call(state, req).await
  }

  async fn identify<S>(state: AppState<S>, body: Value) -> (StatusCode, Value)
  where
    S: ContactStore + Clone + Send + Sync + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
  {
    let (status, text) =
      send(state, "POST", "/identify", &body.to_string()).await;
    (status, serde_json::from_str(&text).unwrap())
  }

  async fn lookup(state: AppState<SqliteStore>, id: &str) -> (StatusCode, Value) {
    let (status, text) =
      send(state, "GET", &format!("/contacts/{id}"), "").await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
  }

  // ── Liveness ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn root_returns_plain_text() {
    let (status, body) = send(make_state().await, "GET", "/", "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("running"), "body: {body}");
  }

  // ── Validation ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_fields_return_400() {
    let state = make_state().await;
    for body in [
      json!({}),
      json!({ "email": null, "phoneNumber": null }),
      json!({ "email": "", "phoneNumber": "" }),
    ] {
      let (status, json) = identify(state.clone(), body).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert_eq!(
        json,
        json!({ "error": "Either email or phoneNumber is required" })
      );
    }
  }

  #[tokio::test]
  async fn malformed_body_is_a_json_400() {
    let state = make_state().await;
    for body in ["{not json", r#"{"email": 5}"#, r#"{"phoneNumber": [1]}"#] {
      let (status, text) =
        send(state.clone(), "POST", "/identify", body).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
      let json: Value = serde_json::from_str(&text).unwrap();
      assert!(json["error"].is_string(), "response: {text}");
    }
  }

  #[tokio::test]
  async fn request_without_content_type_is_read_as_empty() {
    let req = Request::builder()
      .method("POST")
      .uri("/identify")
      .body(Body::empty())
      .unwrap();
    let (status, text) = call(make_state().await, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
      json,
      json!({ "error": "Either email or phoneNumber is required" })
    );
  }

  // ── Identify ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn new_email_creates_primary() {
    let (status, json) =
      identify(make_state().await, json!({ "email": "new@x.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      json,
      json!({
        "contact": {
          "primaryContactId": 1,
          "emails": ["new@x.com"],
          "phoneNumbers": [],
          "secondaryContactIds": [],
        }
      })
    );
  }

  #[tokio::test]
  async fn numeric_phone_number_is_accepted() {
    let (status, json) =
      identify(make_state().await, json!({ "phoneNumber": 123456 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["contact"]["phoneNumbers"], json!(["123456"]));
  }

  #[tokio::test]
  async fn linking_flow_over_http() {
    let state = make_state().await;

    identify(
      state.clone(),
      json!({ "email": "lorraine@hillvalley.edu", "phoneNumber": "123456" }),
    )
    .await;
    let (_, json) = identify(
      state.clone(),
      json!({ "email": "mcfly@hillvalley.edu", "phoneNumber": "123456" }),
    )
    .await;
    assert_eq!(
      json,
      json!({
        "contact": {
          "primaryContactId": 1,
          "emails": ["lorraine@hillvalley.edu", "mcfly@hillvalley.edu"],
          "phoneNumbers": ["123456"],
          "secondaryContactIds": [2],
        }
      })
    );

    // A separate individual, then a request that bridges both clusters.
    identify(
      state.clone(),
      json!({ "email": "george@hillvalley.edu", "phoneNumber": "919191" }),
    )
    .await;
    let (status, json) = identify(
      state,
      json!({ "email": "lorraine@hillvalley.edu", "phoneNumber": "919191" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      json,
      json!({
        "contact": {
          "primaryContactId": 1,
          "emails": [
            "lorraine@hillvalley.edu",
            "mcfly@hillvalley.edu",
            "george@hillvalley.edu",
          ],
          "phoneNumbers": ["123456", "919191"],
          "secondaryContactIds": [2, 3],
        }
      })
    );
  }

  // ── Lookup ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn lookup_by_any_member_returns_the_cluster() {
    let state = make_state().await;
    identify(
      state.clone(),
      json!({ "email": "lorraine@hillvalley.edu", "phoneNumber": "123456" }),
    )
    .await;
    let (_, identified) = identify(
      state.clone(),
      json!({ "email": "mcfly@hillvalley.edu", "phoneNumber": "123456" }),
    )
    .await;

    let (status, by_primary) = lookup(state.clone(), "1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_primary, identified);

    let (status, by_secondary) = lookup(state.clone(), "2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_secondary, identified);

    assert!(
      state.store.get_contact(3).await.unwrap().is_none(),
      "lookups never write"
    );
  }

  #[tokio::test]
  async fn lookup_of_unknown_id_is_404() {
    let (status, json) = lookup(make_state().await, "404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({ "error": "contact 404 not found" }));
  }

  // ── Internal errors ──────────────────────────────────────────────────────────

  /// A store that always fails, optionally after stalling. Keeps the token of
  /// the last identify call.
  #[derive(Clone, Default)]
  struct BrokenStore {
    stall:      Option<Duration>,
    last_token: Arc<Mutex<Option<Cancellation>>>,
  }

  impl ContactStore for BrokenStore {
    type Error = std::io::Error;

    async fn identify(
      &self,
      _request: IdentifyRequest,
      cancel: Cancellation,
    ) -> Result<ConsolidatedContact, Self::Error> {
      *self.last_token.lock().unwrap() = Some(cancel);
      if let Some(stall) = self.stall {
        tokio::time::sleep(stall).await;
      }
      Err(std::io::Error::other("disk unavailable"))
    }

    async fn get_contact(
      &self,
      _id: ContactId,
    ) -> Result<Option<Contact>, Self::Error> {
      Err(std::io::Error::other("disk unavailable"))
    }

    async fn cluster(
      &self,
      _primary_id: ContactId,
    ) -> Result<Vec<Contact>, Self::Error> {
      Ok(Vec::new())
    }
  }

  #[tokio::test]
  async fn store_failure_returns_500_with_details() {
    let state = AppState {
      store:         Arc::new(BrokenStore::default()),
      store_timeout: Duration::from_secs(5),
    };
    let (status, json) = identify(state, json!({ "email": "a@x.com" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal Server Error");
    let details = json["details"].as_str().unwrap();
    assert!(details.contains("disk unavailable"), "details: {details}");
  }

  #[tokio::test]
  async fn lookup_failure_returns_500() {
    let state = AppState {
      store:         Arc::new(BrokenStore::default()),
      store_timeout: Duration::from_secs(5),
    };
    let (status, text) = send(state, "GET", "/contacts/1", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text.contains("disk unavailable"), "body: {text}");
  }

  #[tokio::test]
  async fn slow_store_times_out_and_is_cancelled() {
    let store = BrokenStore {
      stall: Some(Duration::from_secs(60)),
      ..Default::default()
    };
    let last_token = store.last_token.clone();
    let state = AppState {
      store:         Arc::new(store),
      store_timeout: Duration::from_millis(20),
    };

    let (status, json) = identify(state, json!({ "email": "a@x.com" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let details = json["details"].as_str().unwrap();
    assert!(details.contains("timed out"), "details: {details}");
    let token = last_token.lock().unwrap().clone().unwrap();
    assert!(token.is_cancelled());
  }

  /// Claims the commit immediately, then takes longer than the timeout to
  /// finish it.
  #[derive(Clone)]
  struct SlowCommitStore;

  impl ContactStore for SlowCommitStore {
    type Error = std::io::Error;

    async fn identify(
      &self,
      _request: IdentifyRequest,
      cancel: Cancellation,
    ) -> Result<ConsolidatedContact, Self::Error> {
      assert!(cancel.claim_commit());
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok(ConsolidatedContact {
        primary_contact_id:    1,
        emails:                vec!["a@x.com".into()],
        phone_numbers:         Vec::new(),
        secondary_contact_ids: Vec::new(),
      })
    }

    async fn get_contact(
      &self,
      _id: ContactId,
    ) -> Result<Option<Contact>, Self::Error> {
      Ok(None)
    }

    async fn cluster(
      &self,
      _primary_id: ContactId,
    ) -> Result<Vec<Contact>, Self::Error> {
      Ok(Vec::new())
    }
  }

  #[tokio::test]
  async fn committing_store_is_awaited_past_the_timeout() {
    let state = AppState {
      store:         Arc::new(SlowCommitStore),
      store_timeout: Duration::from_millis(10),
    };
    let (status, json) = identify(state, json!({ "email": "a@x.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["contact"]["primaryContactId"], 1);
  }
}
