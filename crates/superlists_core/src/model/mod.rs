//! Domain records for lists, items and users.
//!
//! # Invariants
//! - Lists and items are identified by store-assigned integer ids.
//! - Users are identified by their normalized email address.

pub mod item;
pub mod list;
pub mod user;
