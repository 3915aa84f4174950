//! Account persistence: users, one-time login tokens and sessions.
//!
//! # Invariants
//! - Emails are stored exactly as given; callers normalize first.
//! - A login token is deleted in the same transaction that redeems it.
//! - Sessions reference registered users only.

use crate::model::user::User;
use crate::repo::{ensure_schema_ready, user_exists, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

/// One-time login link token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginToken {
    pub uid: Uuid,
    pub email: String,
}

/// Repository interface for account records.
pub trait AccountRepository {
    /// Returns the user registered under `email`.
    fn get_user(&self, email: &str) -> RepoResult<Option<User>>;
    /// Registers `email` if needed and returns the user.
    fn ensure_user(&self, email: &str) -> RepoResult<User>;
    /// Stores a fresh login token for `email`.
    fn create_login_token(&self, email: &str) -> RepoResult<LoginToken>;
    /// Deletes and returns the token with `uid`, if it exists.
    fn take_login_token(&mut self, uid: Uuid) -> RepoResult<Option<LoginToken>>;
    /// Opens a session for a registered user and returns its key.
    fn create_session(&self, email: &str) -> RepoResult<String>;
    /// Resolves a session key to its user.
    fn session_user(&self, session_key: &str) -> RepoResult<Option<User>>;
    /// Removes a session. Unknown keys are ignored.
    fn delete_session(&self, session_key: &str) -> RepoResult<()>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn get_user(&self, email: &str) -> RepoResult<Option<User>> {
        let found = self
            .conn
            .query_row(
                "SELECT email FROM users WHERE email = ?1;",
                [email],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(found.map(|email| User { email }))
    }

    fn ensure_user(&self, email: &str) -> RepoResult<User> {
        self.conn.execute(
            "INSERT OR IGNORE INTO users (email) VALUES (?1);",
            [email],
        )?;
        Ok(User {
            email: email.to_string(),
        })
    }

    fn create_login_token(&self, email: &str) -> RepoResult<LoginToken> {
        let uid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO login_tokens (uid, email) VALUES (?1, ?2);",
            params![uid.to_string(), email],
        )?;
        Ok(LoginToken {
            uid,
            email: email.to_string(),
        })
    }

    fn take_login_token(&mut self, uid: Uuid) -> RepoResult<Option<LoginToken>> {
        let uid_text = uid.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let email = tx
            .query_row(
                "SELECT email FROM login_tokens WHERE uid = ?1;",
                [uid_text.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        if email.is_some() {
            tx.execute(
                "DELETE FROM login_tokens WHERE uid = ?1;",
                [uid_text.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(email.map(|email| LoginToken { uid, email }))
    }

    fn create_session(&self, email: &str) -> RepoResult<String> {
        if !user_exists(self.conn, email)? {
            return Err(RepoError::UserNotFound(email.to_string()));
        }
        let session_key = Uuid::new_v4().simple().to_string();
        self.conn.execute(
            "INSERT INTO sessions (session_key, email) VALUES (?1, ?2);",
            params![session_key.as_str(), email],
        )?;
        Ok(session_key)
    }

    fn session_user(&self, session_key: &str) -> RepoResult<Option<User>> {
        let found = self
            .conn
            .query_row(
                "SELECT email FROM sessions WHERE session_key = ?1;",
                [session_key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(found.map(|email| User { email }))
    }

    fn delete_session(&self, session_key: &str) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM sessions WHERE session_key = ?1;",
            [session_key],
        )?;
        Ok(())
    }
}
