//! Cancellation shared between a caller and a unit of work running elsewhere.
//!
//! A [`Cancellation`] settles exactly once: either the caller cancels, or the
//! store claims the right to commit. Whichever happens first wins, so a caller
//! that gave up never sees the unit of work applied behind its back.

use std::sync::{
  Arc,
  atomic::{AtomicU8, Ordering},
};

const PENDING: u8 = 0;
const CANCELLED: u8 = 1;
const COMMITTING: u8 = 2;

#[derive(Debug, Clone)]
pub struct Cancellation {
  state: Arc<AtomicU8>,
}

impl Cancellation {
  pub fn new() -> Self {
    Self {
      state: Arc::new(AtomicU8::new(PENDING)),
    }
  }

  /// Ask the unit of work to abandon its changes.
  ///
  /// Returns `false` if the store already claimed the commit; the caller
  /// should then wait for the outcome instead of reporting a failure.
  pub fn cancel(&self) -> bool {
    match self.state.compare_exchange(
      PENDING,
      CANCELLED,
      Ordering::SeqCst,
      Ordering::SeqCst,
    ) {
      Ok(_) => true,
      Err(current) => current == CANCELLED,
    }
  }

  /// Called by the store right before committing. Returns `false` if the
  /// caller cancelled first, in which case the changes must be rolled back.
  pub fn claim_commit(&self) -> bool {
    match self.state.compare_exchange(
      PENDING,
      COMMITTING,
      Ordering::SeqCst,
      Ordering::SeqCst,
    ) {
      Ok(_) => true,
      Err(current) => current == COMMITTING,
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.state.load(Ordering::SeqCst) == CANCELLED
  }
}

impl Default for Cancellation {
  fn default() -> Self { Self::new() }
}
