//! Web-layer error type and its HTTP mapping.
//!
//! # Responsibility
//! - Wrap core and infrastructure failures behind one handler error type.
//! - Map errors to status codes without leaking internals to the client.
//!
//! # Invariants
//! - Missing lists and unknown routes render the 404 page.
//! - Everything else is logged and answered with a generic 500 page.

use crate::mailer::MailError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use log::error;
use superlists_core::{AccountServiceError, ListServiceError, RepoError};
use thiserror::Error;

const NOT_FOUND_PAGE: &str = include_str!("../templates/not_found.html");
const SERVER_ERROR_PAGE: &str = "<!doctype html><html><head><meta charset=\"utf-8\"><title>Server error</title></head><body><h1>Something went wrong</h1><p>Please try again later.</p></body></html>";

/// Result alias used by handlers.
pub type WebResult<T> = Result<T, WebError>;

/// Errors that can end a request.
#[derive(Debug, Error)]
pub enum WebError {
    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("list service error: {0}")]
    Lists(#[from] ListServiceError),

    #[error("account service error: {0}")]
    Accounts(#[from] AccountServiceError),

    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("mail delivery failed: {0}")]
    Mail(#[from] MailError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Shared state is unusable (for example a poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    /// HTTP status this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Lists(ListServiceError::ListNotFound(_))
            | Self::Lists(ListServiceError::UserNotFound(_))
            | Self::Repo(RepoError::ListNotFound(_))
            | Self::Repo(RepoError::UserNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Lists(ListServiceError::Invalid(_))
            | Self::Lists(ListServiceError::InvalidShareTarget(_))
            | Self::Accounts(AccountServiceError::InvalidEmail(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::NOT_FOUND => (status, Html(NOT_FOUND_PAGE)).into_response(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!("event=http_error module=web status=error error={}", self);
                (status, Html(SERVER_ERROR_PAGE)).into_response()
            }
            _ => (status, self.to_string()).into_response(),
        }
    }
}
