//! A validated identify request.

use crate::{Error, Result};

/// The contact fact submitted by a caller. At least one of the two fields is
/// always present; empty strings are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyRequest {
  email:        Option<String>,
  phone_number: Option<String>,
}

impl IdentifyRequest {
  /// Validate raw input. Fails with [`Error::MissingContactFact`] when neither
  /// field carries a value.
  pub fn new(
    email: Option<String>,
    phone_number: Option<String>,
  ) -> Result<Self> {
    let email = email.filter(|e| !e.is_empty());
    let phone_number = phone_number.filter(|p| !p.is_empty());

    if email.is_none() && phone_number.is_none() {
      return Err(Error::MissingContactFact);
    }
    Ok(Self { email, phone_number })
  }

  pub fn email(&self) -> Option<&str> { self.email.as_deref() }

  pub fn phone_number(&self) -> Option<&str> { self.phone_number.as_deref() }
}
