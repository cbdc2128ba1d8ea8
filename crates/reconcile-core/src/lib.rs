//! Core types, traits, and the contact-linking algorithm for the identity
//! reconciliation service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`ledger::ContactLedger`] for a single unit of
//! work and [`store::ContactStore`] for the shared, async-facing handle.

pub mod cancel;
pub mod contact;
pub mod error;
pub mod ledger;
pub mod linker;
pub mod request;
pub mod store;
pub mod view;

pub use error::{Error, Result};
