//! Handler for `GET /`.

/// Plain-text liveness probe.
pub async fn handler() -> &'static str {
  "Identity reconciliation service is running."
}
