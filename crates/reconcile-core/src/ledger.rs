//! The `ContactLedger` trait: store operations available inside one unit of
//! work.
//!
//! A ledger is borrowed for the duration of a single identify call. Backends
//! that support transactions hand the linker a ledger bound to an open
//! transaction, so every read and write below commits or rolls back together.

use crate::contact::{Contact, ContactId, LinkPrecedence, NewContact};

pub trait ContactLedger {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All contacts whose email equals `email` or whose phone number equals
  /// `phone_number`. An absent argument matches nothing.
  fn find_by_email_or_phone(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>, Self::Error>;

  /// The contact `primary_id` plus every contact linked to it.
  fn find_by_linked_id_or_id(
    &mut self,
    primary_id: ContactId,
  ) -> Result<Vec<Contact>, Self::Error>;

  /// The oldest contact carrying exactly this combination of facts. An absent
  /// argument does not constrain the match.
  fn find_exact_match(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Option<Contact>, Self::Error>;

  /// Look up a single contact. Returns `None` if not found.
  fn get(&mut self, id: ContactId) -> Result<Option<Contact>, Self::Error>;

  /// Persist a new contact; the store assigns `id` and timestamps.
  fn create(&mut self, input: NewContact) -> Result<Contact, Self::Error>;

  /// Rewrite a contact's precedence and back-reference.
  fn update_precedence(
    &mut self,
    id: ContactId,
    precedence: LinkPrecedence,
    linked_id: Option<ContactId>,
  ) -> Result<(), Self::Error>;
}
