//! Repository contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Own every SQL statement that reads or writes lists, items, shares and accounts.
//! - Translate SQLite failures into semantic errors (`ListNotFound`, `DuplicateItem`).
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - Store constraints stay authoritative; application checks are fast paths.

use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::Connection;

pub mod account_repo;
pub mod list_repo;

pub use list_repo::{RepoError, RepoResult};

fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn bool_from_exists(value: i64) -> bool {
    value == 1
}

fn user_exists(conn: &Connection, email: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1);",
        [email],
        |row| row.get(0),
    )?;
    Ok(bool_from_exists(exists))
}
