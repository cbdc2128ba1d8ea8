//! [`SqliteLedger`]: [`ContactLedger`] over a borrowed SQLite connection.
//!
//! [`crate::SqliteStore`] binds a ledger to an open transaction, so the
//! statements below run synchronously on the `tokio_rusqlite` worker thread.

use chrono::{SubsecRound as _, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};

use reconcile_core::{
  contact::{Contact, ContactId, LinkPrecedence, NewContact},
  ledger::ContactLedger,
};

use crate::{
  Error, Result,
  encode::{RawContact, encode_dt, encode_precedence},
  schema::CONTACT_COLUMNS,
};

pub struct SqliteLedger<'c> {
  conn: &'c Connection,
}

impl<'c> SqliteLedger<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }

  /// Every contact, oldest first.
  #[cfg(test)]
  pub fn all(&mut self) -> Result<Vec<Contact>> {
    self.select("1 = 1", params![])
  }

  fn select(
    &self,
    where_clause: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Contact>> {
    let sql = format!(
      "SELECT {CONTACT_COLUMNS} FROM contacts WHERE {where_clause}
       ORDER BY id"
    );
    let mut stmt = self.conn.prepare_cached(&sql)?;
    let raws = stmt
      .query_map(params, RawContact::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawContact::into_contact).collect()
  }
}

impl ContactLedger for SqliteLedger<'_> {
  type Error = Error;

  fn find_by_email_or_phone(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>> {
    // `col = NULL` is never true, so an absent argument matches nothing.
    self.select("email = ?1 OR phone_number = ?2", params![
      email,
      phone_number
    ])
  }

  fn find_by_linked_id_or_id(
    &mut self,
    primary_id: ContactId,
  ) -> Result<Vec<Contact>> {
    self.select("id = ?1 OR linked_id = ?1", params![primary_id])
  }

  fn find_exact_match(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Option<Contact>> {
    let rows = self.select(
      "(?1 IS NULL OR email = ?1) AND (?2 IS NULL OR phone_number = ?2)",
      params![email, phone_number],
    )?;
    Ok(rows.into_iter().next())
  }

  fn get(&mut self, id: ContactId) -> Result<Option<Contact>> {
    let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1");
    let raw = self
      .conn
      .query_row(&sql, params![id], RawContact::from_row)
      .optional()?;
    raw.map(RawContact::into_contact).transpose()
  }

  fn create(&mut self, input: NewContact) -> Result<Contact> {
    // Match the precision stored in the column.
    let now = Utc::now().trunc_subsecs(6);
    let now_str = encode_dt(now);

    self.conn.execute(
      "INSERT INTO contacts (
         email, phone_number, linked_id, link_precedence, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      params![
        input.email,
        input.phone_number,
        input.linked_id,
        encode_precedence(input.link_precedence),
        now_str,
      ],
    )?;

    Ok(Contact {
      id:              self.conn.last_insert_rowid(),
      email:           input.email,
      phone_number:    input.phone_number,
      linked_id:       input.linked_id,
      link_precedence: input.link_precedence,
      created_at:      now,
      updated_at:      now,
    })
  }

  fn update_precedence(
    &mut self,
    id: ContactId,
    precedence: LinkPrecedence,
    linked_id: Option<ContactId>,
  ) -> Result<()> {
    let changed = self.conn.execute(
      "UPDATE contacts
          SET link_precedence = ?2, linked_id = ?3, updated_at = ?4
        WHERE id = ?1",
      params![
        id,
        encode_precedence(precedence),
        linked_id,
        encode_dt(Utc::now()),
      ],
    )?;
    if changed == 0 {
      return Err(Error::ContactNotFound(id));
    }
    Ok(())
  }
}
