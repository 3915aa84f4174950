//! Use-case services called by the HTTP layer.
//!
//! # Responsibility
//! - Gate raw user input through validation before any store mutation.
//! - Keep handlers free of SQL and of ambient identity lookups.
//!
//! # Invariants
//! - The current identity is always an explicit argument.

pub mod account_service;
pub mod item_form;
pub mod list_service;
