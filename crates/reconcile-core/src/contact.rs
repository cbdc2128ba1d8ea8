//! Contact: the single row type of the reconciliation store.
//!
//! Contacts form a flat table with a nullable back-reference: a secondary
//! contact's `linked_id` names the primary of its cluster, and a primary has no
//! `linked_id` at all. No chain is ever deeper than one hop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::IdentifyRequest;

/// Store-assigned row identifier. Monotonically increasing with creation
/// order, so "oldest" always means "smallest id", whatever the wall clock did.
pub type ContactId = i64;

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact is the canonical record of its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

impl LinkPrecedence {
  /// The string stored in the `link_precedence` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Primary => "primary",
      Self::Secondary => "secondary",
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A persisted contact row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  /// Present only on secondaries; always names a primary.
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
  /// Server-assigned; never changes after creation.
  pub created_at:      DateTime<Utc>,
  /// Bumped when the contact is demoted or relinked during a merge.
  pub updated_at:      DateTime<Utc>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::ledger::ContactLedger::create`].
/// `id` and the timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
}

impl NewContact {
  /// A fresh primary carrying the request's facts.
  pub fn primary(request: &IdentifyRequest) -> Self {
    Self {
      email:           request.email().map(str::to_owned),
      phone_number:    request.phone_number().map(str::to_owned),
      linked_id:       None,
      link_precedence: LinkPrecedence::Primary,
    }
  }

  /// A secondary attached to `primary_id`, carrying the request's facts.
  pub fn secondary(request: &IdentifyRequest, primary_id: ContactId) -> Self {
    Self {
      email:           request.email().map(str::to_owned),
      phone_number:    request.phone_number().map(str::to_owned),
      linked_id:       Some(primary_id),
      link_precedence: LinkPrecedence::Secondary,
    }
  }
}
