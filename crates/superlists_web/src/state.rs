//! Shared application state handed to every handler.
//!
//! # Responsibility
//! - Own the single SQLite connection and run store work off the async runtime.
//! - Carry templates, the mail transport and the public base URL.
//!
//! # Invariants
//! - The connection is only touched on blocking threads, one request at a time.

use crate::error::{WebError, WebResult};
use crate::mailer::Mailer;
use crate::render::Templates;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Cloneable handle to process-wide resources.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    templates: Arc<Templates>,
    mailer: Arc<dyn Mailer>,
    base_url: Arc<str>,
}

impl AppState {
    /// Builds state around an already-migrated connection.
    ///
    /// `base_url` prefixes the links placed in login emails.
    pub fn new(
        conn: Connection,
        mailer: Arc<dyn Mailer>,
        base_url: impl Into<String>,
    ) -> WebResult<Self> {
        let base_url: String = base_url.into();
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            templates: Arc::new(Templates::new()?),
            mailer,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Runs `work` against the connection on a blocking thread.
    pub async fn with_db<T, F>(&self, work: F) -> WebResult<T>
    where
        F: FnOnce(&mut Connection) -> WebResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|_| WebError::Internal("database lock poisoned".to_string()))?;
            work(&mut conn)
        })
        .await?
    }
}
