//! The consolidated view: the computed read model for a cluster.

use std::iter;

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId, LinkPrecedence};

/// Everything known about one individual: never stored, always derived from
/// the cluster rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
  pub primary_contact_id:    ContactId,
  /// Primary's email first, then in discovery order; no duplicates.
  pub emails:                Vec<String>,
  /// Primary's phone number first, then in discovery order; no duplicates.
  pub phone_numbers:         Vec<String>,
  /// Ascending.
  pub secondary_contact_ids: Vec<ContactId>,
}

impl ConsolidatedContact {
  /// Build the view for the cluster headed by `primary`.
  ///
  /// `members` is the cluster as read from the store; it normally contains
  /// `primary` too, in which case that copy wins.
  pub fn from_cluster(primary: &Contact, members: &[Contact]) -> Self {
    let head = members
      .iter()
      .find(|c| c.id == primary.id)
      .unwrap_or(primary);

    let mut rest: Vec<&Contact> =
      members.iter().filter(|c| c.id != primary.id).collect();
    rest.sort_by_key(|c| c.id);

    let mut emails = Vec::new();
    let mut phone_numbers = Vec::new();
    for contact in iter::once(head).chain(rest) {
      push_unique(&mut emails, contact.email.as_deref());
      push_unique(&mut phone_numbers, contact.phone_number.as_deref());
    }

    let mut secondary_contact_ids: Vec<ContactId> = members
      .iter()
      .filter(|c| c.link_precedence == LinkPrecedence::Secondary)
      .map(|c| c.id)
      .collect();
    secondary_contact_ids.sort_unstable();
    secondary_contact_ids.dedup();

    Self {
      primary_contact_id: primary.id,
      emails,
      phone_numbers,
      secondary_contact_ids,
    }
  }
}

fn push_unique(values: &mut Vec<String>, value: Option<&str>) {
  if let Some(v) = value
    && !v.is_empty()
    && !values.iter().any(|existing| existing == v)
  {
    values.push(v.to_owned());
  }
}
