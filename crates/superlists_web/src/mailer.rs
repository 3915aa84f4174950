//! Outgoing mail seam for login links.
//!
//! # Responsibility
//! - Define the transport contract used by the login flow.
//! - Deliver messages as plain text to stdout or an append-only file.
//! - Provide a bounded in-process outbox for tests.
//!
//! # Invariants
//! - Log lines carry the recipient domain only, never the full address or body.
//! - The outbox never holds more than `OUTBOX_CAPACITY` messages.

use log::info;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::sync::Mutex;
use superlists_core::model::user::email_domain;
use superlists_core::LoginEmail;
use thiserror::Error;

/// Messages kept by `OutboxMailer` before the oldest are dropped.
pub const OUTBOX_CAPACITY: usize = 100;

const MESSAGE_SEPARATOR: &str = "----------------------------------------";

/// Mail transport failure.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
    #[error("mail write failed: {0}")]
    Write(#[from] io::Error),
}

/// Delivers login emails.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &LoginEmail) -> Result<(), MailError>;
}

/// Writes each message as a plain-text block to a stream.
#[derive(Debug)]
pub struct StreamMailer<W> {
    target: &'static str,
    out: Mutex<W>,
}

impl StreamMailer<Stdout> {
    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }
}

impl StreamMailer<File> {
    /// Opens `path` for appending, creating it when missing.
    pub fn append_to(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new("file", file))
    }
}

impl<W: Write + Send> StreamMailer<W> {
    pub fn new(target: &'static str, out: W) -> Self {
        Self {
            target,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Mailer for StreamMailer<W> {
    fn send(&self, email: &LoginEmail) -> Result<(), MailError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| MailError::Unavailable(format!("{} lock poisoned", self.target)))?;
        write!(
            out,
            "To: {}\nSubject: {}\n\n{}\n{}\n",
            email.to, email.subject, email.body, MESSAGE_SEPARATOR
        )?;
        out.flush()?;
        info!(
            "event=mail_send module=mailer status=ok transport={} to_domain={}",
            self.target,
            email_domain(&email.to)
        );
        Ok(())
    }
}

/// Mailer that keeps the most recent messages in memory.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    outbox: Mutex<VecDeque<LoginEmail>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the retained messages, oldest first.
    pub fn sent(&self) -> Vec<LoginEmail> {
        let outbox = match self.outbox.lock() {
            Ok(outbox) => outbox,
            Err(poisoned) => poisoned.into_inner(),
        };
        outbox.iter().cloned().collect()
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, email: &LoginEmail) -> Result<(), MailError> {
        let mut outbox = self
            .outbox
            .lock()
            .map_err(|_| MailError::Unavailable("outbox lock poisoned".to_string()))?;
        if outbox.len() == OUTBOX_CAPACITY {
            outbox.pop_front();
        }
        outbox.push_back(email.clone());
        info!(
            "event=mail_send module=mailer status=ok transport=outbox to_domain={} outbox_len={}",
            email_domain(&email.to),
            outbox.len()
        );
        Ok(())
    }
}
