//! Notification transport collaborator.
//!
//! Delivery is best-effort and non-blocking for the engine: a transport
//! reports failures through [`TransportError`], and [`BestEffort`] turns every
//! such failure into a log line. Nothing is retried here.

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("notification has no recipients")]
    NoRecipients,

    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("transport rejected message: {0}")]
    Rejected(String),
}

pub trait NotificationTransport {
    fn send(&self, message: &Notification) -> Result<(), TransportError>;
}

impl<T: NotificationTransport + ?Sized> NotificationTransport for &T {
    fn send(&self, message: &Notification) -> Result<(), TransportError> {
        (**self).send(message)
    }
}

impl<T: NotificationTransport + ?Sized> NotificationTransport for Box<T> {
    fn send(&self, message: &Notification) -> Result<(), TransportError> {
        (**self).send(message)
    }
}

/// What happened to one hand-off. Never an error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed,
}

/// The boundary where transport failures are swallowed.
pub struct BestEffort<T> {
    inner: T,
}

impl<T: NotificationTransport> BestEffort<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn deliver(&self, message: &Notification) -> Delivery {
        match self.inner.send(message) {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    subject = %message.subject,
                    recipients = message.recipients.len(),
                    "notification delivery failed"
                );
                Delivery::Failed
            }
        }
    }
}

/// Writes every notification to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl NotificationTransport for LogTransport {
    fn send(&self, message: &Notification) -> Result<(), TransportError> {
        if message.recipients.is_empty() {
            return Err(TransportError::NoRecipients);
        }
        tracing::info!(
            to = %message.recipients.join(", "),
            subject = %message.subject,
            "{}",
            message.body
        );
        Ok(())
    }
}

/// Drops each notification as an `.eml` file into a spool directory for an
/// external mailer to pick up.
#[derive(Debug, Clone)]
pub struct SpoolTransport {
    dir: PathBuf,
    from: String,
}

impl SpoolTransport {
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            from: from.into(),
        }
    }

    fn render(&self, message: &Notification) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.from,
            message.recipients.join(", "),
            message.subject.replace(['\r', '\n'], " "),
            Utc::now().to_rfc2822(),
            message.body
        )
    }
}

impl NotificationTransport for SpoolTransport {
    fn send(&self, message: &Notification) -> Result<(), TransportError> {
        if message.recipients.is_empty() {
            return Err(TransportError::NoRecipients);
        }
        fs::create_dir_all(&self.dir)?;

        let name = format!(
            "{}_{}.eml",
            Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4().simple()
        );
        fs::write(self.dir.join(name), self.render(message))?;
        Ok(())
    }
}
