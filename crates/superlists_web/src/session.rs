//! Cookie sessions and the current-user extractor.
//!
//! # Invariants
//! - The session cookie is HttpOnly, SameSite=Lax and scoped to `/`.
//! - Unknown or expired session keys resolve to an anonymous visitor.

use crate::error::WebError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use superlists_core::{AccountService, SqliteAccountRepository};

/// Name of the cookie carrying the session key.
pub const SESSION_COOKIE: &str = "sessionid";

/// Identity of the visitor making the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser {
    /// Logged-in email, `None` for anonymous visitors.
    pub email: Option<String>,
    /// Raw session key presented by the client, valid or not.
    pub session_key: Option<String>,
}

impl CurrentUser {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session_key) = session_key(&parts.headers) else {
            return Ok(Self::default());
        };

        let lookup = session_key.clone();
        let user = state
            .with_db(move |conn| {
                let service = AccountService::new(SqliteAccountRepository::try_new(conn)?);
                Ok(service.session_user(&lookup)?)
            })
            .await?;

        Ok(Self {
            email: user.map(|user| user.email),
            session_key: Some(session_key),
        })
    }
}

/// Extracts the session key from the `Cookie` headers.
pub fn session_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that stores `session_key`.
pub fn session_cookie(session_key: &str) -> String {
    format!("{SESSION_COOKIE}={session_key}; HttpOnly; SameSite=Lax; Path=/")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}
