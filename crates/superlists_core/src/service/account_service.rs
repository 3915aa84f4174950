//! Passwordless login: one-time email links and sessions.
//!
//! # Responsibility
//! - Issue single-use login tokens and compose the login email.
//! - Redeem tokens into registered users and open sessions for them.
//!
//! # Invariants
//! - Emails are normalized before they are stored or compared.
//! - A token can be redeemed at most once; unknown tokens log nobody in.

use crate::model::user::{email_domain, normalize_email, User};
use crate::repo::account_repo::{AccountRepository, LoginToken};
use crate::repo::list_repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Subject line of the login email.
pub const LOGIN_EMAIL_SUBJECT: &str = "Your login link for Superlists";

/// Errors from account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    /// Input is not a usable email address.
    InvalidEmail(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidEmail(_) => None,
        }
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Outgoing login email, ready for a mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl LoginEmail {
    /// Composes the email carrying `token`'s login link under `base_url`.
    pub fn for_token(token: &LoginToken, base_url: &str) -> Self {
        Self {
            to: token.email.clone(),
            subject: LOGIN_EMAIL_SUBJECT.to_string(),
            body: format!(
                "Use this link to log in:\n\n{}",
                login_url(base_url, token.uid)
            ),
        }
    }
}

/// Absolute login URL for a token.
pub fn login_url(base_url: &str, uid: Uuid) -> String {
    format!(
        "{}/accounts/login?token={}",
        base_url.trim_end_matches('/'),
        uid
    )
}

/// Account service facade over an account repository.
pub struct AccountService<R: AccountRepository> {
    repo: R,
}

impl<R: AccountRepository> AccountService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a fresh login token for `raw_email`.
    pub fn issue_login_token(&self, raw_email: &str) -> Result<LoginToken, AccountServiceError> {
        let email = normalize_email(raw_email)
            .ok_or_else(|| AccountServiceError::InvalidEmail(raw_email.to_string()))?;
        let token = self.repo.create_login_token(&email)?;
        info!(
            "event=login_token_issue module=service status=ok email_domain={}",
            email_domain(&email)
        );
        Ok(token)
    }

    /// Consumes a login token and returns the user it belongs to.
    ///
    /// Malformed, unknown and already-used tokens yield `Ok(None)`.
    pub fn redeem_login_token(&mut self, raw_uid: &str) -> Result<Option<User>, AccountServiceError> {
        let Ok(uid) = Uuid::parse_str(raw_uid.trim()) else {
            warn!("event=login_token_redeem module=service status=error error_code=malformed_token");
            return Ok(None);
        };

        match self.repo.take_login_token(uid)? {
            Some(token) => {
                let user = self.repo.ensure_user(&token.email)?;
                info!(
                    "event=login_token_redeem module=service status=ok email_domain={}",
                    email_domain(&user.email)
                );
                Ok(Some(user))
            }
            None => {
                warn!("event=login_token_redeem module=service status=error error_code=unknown_token");
                Ok(None)
            }
        }
    }

    /// Redeems a token and opens a session for the resulting user.
    ///
    /// Returns the user and the new session key.
    pub fn login(&mut self, raw_uid: &str) -> Result<Option<(User, String)>, AccountServiceError> {
        match self.redeem_login_token(raw_uid)? {
            Some(user) => {
                let session_key = self.start_session(&user.email)?;
                Ok(Some((user, session_key)))
            }
            None => Ok(None),
        }
    }

    /// Opens a session for a registered user.
    pub fn start_session(&self, email: &str) -> Result<String, AccountServiceError> {
        Ok(self.repo.create_session(email)?)
    }

    /// Resolves a session key to its user.
    pub fn session_user(&self, session_key: &str) -> Result<Option<User>, AccountServiceError> {
        Ok(self.repo.session_user(session_key)?)
    }

    /// Ends a session. Unknown keys are ignored.
    pub fn end_session(&self, session_key: &str) -> Result<(), AccountServiceError> {
        self.repo.delete_session(session_key)?;
        Ok(())
    }

    /// Looks up a registered user by (unnormalized) email.
    pub fn get_user(&self, raw_email: &str) -> Result<Option<User>, AccountServiceError> {
        match normalize_email(raw_email) {
            Some(email) => Ok(self.repo.get_user(&email)?),
            None => Ok(None),
        }
    }

    /// Registers `raw_email` if needed.
    pub fn ensure_user(&self, raw_email: &str) -> Result<User, AccountServiceError> {
        let email = normalize_email(raw_email)
            .ok_or_else(|| AccountServiceError::InvalidEmail(raw_email.to_string()))?;
        Ok(self.repo.ensure_user(&email)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{login_url, LoginEmail, LOGIN_EMAIL_SUBJECT};
    use crate::repo::account_repo::LoginToken;
    use uuid::Uuid;

    #[test]
    fn login_email_carries_absolute_link() {
        let uid = Uuid::new_v4();
        let token = LoginToken {
            uid,
            email: "edith@example.com".to_string(),
        };
        let email = LoginEmail::for_token(&token, "http://localhost:8000/");
        assert_eq!(email.to, "edith@example.com");
        assert_eq!(email.subject, LOGIN_EMAIL_SUBJECT);
        assert!(email.body.starts_with("Use this link to log in"));
        assert!(email
            .body
            .ends_with(&format!("http://localhost:8000/accounts/login?token={uid}")));
    }

    #[test]
    fn login_url_does_not_double_slashes() {
        let uid = Uuid::nil();
        assert_eq!(
            login_url("https://superlists.example", uid),
            format!("https://superlists.example/accounts/login?token={uid}")
        );
    }
}
