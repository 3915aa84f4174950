//! List/item store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist lists, their items and their share sets.
//! - Answer "which lists can this identity see" queries.
//!
//! # Invariants
//! - Items are returned in creation order (`id ASC`).
//! - `(list_id, text)` is unique; a unique-constraint violation at insert time
//!   surfaces as `ItemValidationError::DuplicateItem`, same as the pre-check.
//! - Creating a list together with its first item is all-or-nothing.
//! - Sharing the same email twice has no additional effect.

use crate::db::DbError;
use crate::model::item::{normalize_item_text, Item, ItemValidationError};
use crate::model::list::{List, ListId, ListSummary};
use crate::repo::{bool_from_exists, ensure_schema_ready, user_exists};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for list, item, share and account persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Item text violates a validation rule.
    Validation(ItemValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Referenced list does not exist.
    ListNotFound(ListId),
    /// Referenced user does not exist.
    UserNotFound(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::UserNotFound(email) => write!(f, "user not found: {email}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the list/item store.
pub trait ListRepository {
    /// Creates an empty list, optionally owned by a registered user.
    fn create_list(&self, owner: Option<&str>) -> RepoResult<List>;
    /// Creates a list and its first item in one transaction.
    fn create_list_with_item(
        &mut self,
        owner: Option<&str>,
        text: &str,
    ) -> RepoResult<(List, Item)>;
    /// Loads one list with its share set.
    fn get_list(&self, id: ListId) -> RepoResult<Option<List>>;
    /// Appends an item to an existing list.
    fn create_item(&self, list_id: ListId, text: &str) -> RepoResult<Item>;
    /// Returns the list's items in creation order.
    fn items_for_list(&self, list_id: ListId) -> RepoResult<Vec<Item>>;
    /// Returns whether the list already holds an item with exactly `text`.
    fn item_text_exists(&self, list_id: ListId, text: &str) -> RepoResult<bool>;
    /// Adds `email` to the list's share set. Idempotent.
    fn share(&self, list_id: ListId, email: &str) -> RepoResult<()>;
    /// Lists owned by `email` or shared with it, ordered by id.
    fn lists_visible_to(&self, email: &str) -> RepoResult<Vec<ListSummary>>;
}

/// SQLite-backed list/item store.
pub struct SqliteListRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ListRepository for SqliteListRepository<'_> {
    fn create_list(&self, owner: Option<&str>) -> RepoResult<List> {
        insert_list(self.conn, owner)
    }

    fn create_list_with_item(
        &mut self,
        owner: Option<&str>,
        text: &str,
    ) -> RepoResult<(List, Item)> {
        // Reject blank text before opening a write transaction.
        let text = normalize_item_text(text)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let list = insert_list(&tx, owner)?;
        let item = insert_item(&tx, list.id, &text)?;
        tx.commit()?;
        Ok((list, item))
    }

    fn get_list(&self, id: ListId) -> RepoResult<Option<List>> {
        let owner: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT owner_email FROM lists WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            Some(owner) => Ok(Some(List {
                id,
                owner,
                shared_with: load_shares(self.conn, id)?,
            })),
            None => Ok(None),
        }
    }

    fn create_item(&self, list_id: ListId, text: &str) -> RepoResult<Item> {
        insert_item(self.conn, list_id, text)
    }

    fn items_for_list(&self, list_id: ListId) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, list_id, text
             FROM items
             WHERE list_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([list_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(Item {
                id: row.get("id")?,
                list_id: row.get("list_id")?,
                text: row.get("text")?,
            });
        }
        Ok(items)
    }

    fn item_text_exists(&self, list_id: ListId, text: &str) -> RepoResult<bool> {
        item_text_exists_in(self.conn, list_id, text)
    }

    fn share(&self, list_id: ListId, email: &str) -> RepoResult<()> {
        if !list_exists(self.conn, list_id)? {
            return Err(RepoError::ListNotFound(list_id));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO list_shares (list_id, email) VALUES (?1, ?2);",
            params![list_id, email],
        )?;
        Ok(())
    }

    fn lists_visible_to(&self, email: &str) -> RepoResult<Vec<ListSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                l.id,
                l.owner_email,
                COALESCE(
                    (SELECT i.text FROM items i WHERE i.list_id = l.id ORDER BY i.id ASC LIMIT 1),
                    ''
                ) AS name
             FROM lists l
             WHERE l.owner_email = ?1
                OR EXISTS (
                    SELECT 1 FROM list_shares s
                    WHERE s.list_id = l.id AND s.email = ?1
                )
             ORDER BY l.id ASC;",
        )?;
        let mut rows = stmt.query([email])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(ListSummary {
                id: row.get("id")?,
                owner: row.get("owner_email")?,
                name: row.get("name")?,
            });
        }
        Ok(lists)
    }
}

fn insert_list(conn: &Connection, owner: Option<&str>) -> RepoResult<List> {
    if let Some(email) = owner {
        if !user_exists(conn, email)? {
            return Err(RepoError::UserNotFound(email.to_string()));
        }
    }
    conn.execute("INSERT INTO lists (owner_email) VALUES (?1);", [owner])?;
    Ok(List {
        id: conn.last_insert_rowid(),
        owner: owner.map(str::to_string),
        shared_with: Vec::new(),
    })
}

fn insert_item(conn: &Connection, list_id: ListId, text: &str) -> RepoResult<Item> {
    let text = normalize_item_text(text)?;
    if !list_exists(conn, list_id)? {
        return Err(RepoError::ListNotFound(list_id));
    }
    if item_text_exists_in(conn, list_id, &text)? {
        return Err(ItemValidationError::DuplicateItem.into());
    }

    match conn.execute(
        "INSERT INTO items (list_id, text) VALUES (?1, ?2);",
        params![list_id, text],
    ) {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            return Err(ItemValidationError::DuplicateItem.into());
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Item {
        id: conn.last_insert_rowid(),
        list_id,
        text,
    })
}

fn load_shares(conn: &Connection, list_id: ListId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT email FROM list_shares WHERE list_id = ?1 ORDER BY email ASC;",
    )?;
    let mut rows = stmt.query([list_id])?;
    let mut emails = Vec::new();
    while let Some(row) = rows.next()? {
        emails.push(row.get(0)?);
    }
    Ok(emails)
}

fn item_text_exists_in(conn: &Connection, list_id: ListId, text: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM items WHERE list_id = ?1 AND text = ?2);",
        params![list_id, text],
        |row| row.get(0),
    )?;
    Ok(bool_from_exists(exists))
}

fn list_exists(conn: &Connection, list_id: ListId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lists WHERE id = ?1);",
        [list_id],
        |row| row.get(0),
    )?;
    Ok(bool_from_exists(exists))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
