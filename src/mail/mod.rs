//! Outgoing mail: the `Mailer` seam and the messages the app sends.

mod smtp;
mod templates;

use std::sync::Mutex;

use tracing::{info, warn};

pub use smtp::SmtpMailer;
pub use templates::{
    CONFIRM_PATH, INVITE_PATH, RESET_PATH, confirmation_email, invitation_email, link,
    password_reset_email,
};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Writes every message to the log instead of delivering it.
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    #[must_use]
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            from = %self.sender,
            to = %message.to,
            subject = %message.subject,
            "outgoing mail\n{}",
            message.body
        );
        Ok(())
    }
}

/// Keeps messages in memory so tests can read the links out of them.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent message sent to `to`.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

/// Sends `message`, logging failures. Returns whether it went out.
pub fn deliver(mailer: &dyn Mailer, message: &EmailMessage) -> bool {
    match mailer.send(message) {
        Ok(()) => true,
        Err(e) => {
            warn!(to = %message.to, subject = %message.subject, error = %e, "failed to send mail");
            false
        }
    }
}

/// Pulls the `token` query value out of the first link in a message body.
#[must_use]
pub fn extract_token(body: &str) -> Option<String> {
    let start = body.find("token=")? + "token=".len();
    let raw: String = body[start..]
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '&')
        .collect();
    urlencoding::decode(&raw).ok().map(|t| t.into_owned())
}
