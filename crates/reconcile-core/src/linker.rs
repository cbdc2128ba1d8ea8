//! The contact-linking algorithm.
//!
//! [`identify`] matches an incoming fact against existing contacts, merges
//! every cluster the fact touches into the oldest one, records the fact as a
//! secondary when it adds something new, and returns the consolidated view.
//!
//! The function only talks to a [`ContactLedger`]; atomicity is the caller's
//! job (see [`crate::store::ContactStore::identify`]).

use tracing::debug;

use crate::{
  Error, Result,
  contact::{Contact, LinkPrecedence, NewContact},
  ledger::ContactLedger,
  request::IdentifyRequest,
  view::ConsolidatedContact,
};

/// Reconcile `request` against the contacts visible through `ledger`.
///
/// Creates at most one contact. May demote any number of primaries when the
/// request bridges clusters. Never deletes.
pub fn identify<L>(
  ledger: &mut L,
  request: &IdentifyRequest,
) -> Result<ConsolidatedContact>
where
  L: ContactLedger + ?Sized,
{
  let email = request.email();
  let phone_number = request.phone_number();

  let matches = ledger
    .find_by_email_or_phone(email, phone_number)
    .map_err(Error::store)?;

  let Some(oldest_match) = matches.iter().min_by_key(|c| c.id) else {
    let contact = ledger
      .create(NewContact::primary(request))
      .map_err(Error::store)?;
    debug!(contact_id = contact.id, "no match; created primary contact");
    return Ok(ConsolidatedContact::from_cluster(
      &contact,
      std::slice::from_ref(&contact),
    ));
  };

  let primaries = matched_primaries(ledger, &matches)?;
  let survivor = match primaries.split_first() {
    Some((oldest, younger)) => {
      merge_into(ledger, oldest, younger)?;
      oldest.clone()
    }
    // Only reachable with rows that already violate the cluster invariants.
    None => oldest_match.clone(),
  };

  let cluster = ledger
    .find_by_linked_id_or_id(survivor.id)
    .map_err(Error::store)?;

  if observes_new_fact(&cluster, email, phone_number) {
    match ledger
      .find_exact_match(email, phone_number)
      .map_err(Error::store)?
    {
      Some(existing) => {
        debug!(
          contact_id = existing.id,
          "fact already recorded; skipping secondary creation"
        );
      }
      None => {
        let created = ledger
          .create(NewContact::secondary(request, survivor.id))
          .map_err(Error::store)?;
        debug!(
          contact_id = created.id,
          primary_id = survivor.id,
          "created secondary contact"
        );
      }
    }
  }

  let cluster = ledger
    .find_by_linked_id_or_id(survivor.id)
    .map_err(Error::store)?;
  Ok(ConsolidatedContact::from_cluster(&survivor, &cluster))
}

/// Every primary touched by `matches`, oldest first.
///
/// A matched secondary contributes the primary it links to, so a fact that
/// hits any member of a cluster pulls in the whole cluster.
fn matched_primaries<L>(
  ledger: &mut L,
  matches: &[Contact],
) -> Result<Vec<Contact>>
where
  L: ContactLedger + ?Sized,
{
  let mut primaries: Vec<Contact> =
    matches.iter().filter(|c| c.is_primary()).cloned().collect();

  for contact in matches.iter().filter(|c| !c.is_primary()) {
    let Some(linked_id) = contact.linked_id else { continue };
    if primaries.iter().any(|p| p.id == linked_id) {
      continue;
    }
    if let Some(linked) = ledger.get(linked_id).map_err(Error::store)?
      && linked.is_primary()
    {
      primaries.push(linked);
    }
  }

  primaries.sort_by_key(|c| c.id);
  Ok(primaries)
}

/// Demote each of `younger` (and re-point its secondaries) under `survivor`.
fn merge_into<L>(
  ledger: &mut L,
  survivor: &Contact,
  younger: &[Contact],
) -> Result<()>
where
  L: ContactLedger + ?Sized,
{
  for demoted in younger {
    debug!(
      survivor_id = survivor.id,
      demoted_id = demoted.id,
      "merging clusters"
    );
    // Includes `demoted` itself.
    let members = ledger
      .find_by_linked_id_or_id(demoted.id)
      .map_err(Error::store)?;
    for member in members {
      ledger
        .update_precedence(
          member.id,
          LinkPrecedence::Secondary,
          Some(survivor.id),
        )
        .map_err(Error::store)?;
    }
  }
  Ok(())
}

fn observes_new_fact(
  cluster: &[Contact],
  email: Option<&str>,
  phone_number: Option<&str>,
) -> bool {
  let new_email = email
    .is_some_and(|e| !cluster.iter().any(|c| c.email.as_deref() == Some(e)));
  let new_phone = phone_number.is_some_and(|p| {
    !cluster.iter().any(|c| c.phone_number.as_deref() == Some(p))
  });
  new_email || new_phone
}
