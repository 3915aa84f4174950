//! HTTP surface for Superlists.
//!
//! # Responsibility
//! - Serve list, sharing and login pages over axum.
//! - Resolve the visitor's identity per request and pass it to core services.
//!
//! # See also
//! - `superlists_core` for validation and persistence rules.

pub mod error;
pub mod mailer;
mod middleware;
pub mod render;
mod router;
pub mod session;
pub mod state;
pub mod views;

pub use error::{WebError, WebResult};
pub use mailer::{MailError, Mailer, OutboxMailer, StreamMailer, OUTBOX_CAPACITY};
pub use router::app;
pub use session::{CurrentUser, SESSION_COOKIE};
pub use state::AppState;
