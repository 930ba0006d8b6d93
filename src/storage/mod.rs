//! Persistence for the gate's three lists.
//! Records are stored as JSON documents on disk, one per list,
//! with a backup copy taken before every overwrite.

mod list_store;
mod records;

pub use list_store::{ListGuard, ListStore};
pub use records::{AccessAttempt, AllowEntry, DenyEntry, ListName};
