use std::sync::Arc;

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use super::{EmailMessage, Mailer};
use crate::config::MailSettings;
use crate::error::{Error, Result};

/// Delivers mail through the SMTP relay named by `MAIL_SERVER`.
///
/// `send` queues the message on the Tokio runtime; delivery failures are logged.
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Returns `None` when no SMTP server is configured.
    pub fn from_settings(settings: &MailSettings) -> Result<Option<Self>> {
        let Some(server) = settings.server.as_deref() else {
            return Ok(None);
        };

        let sender: Mailbox = settings
            .default_sender
            .parse()
            .map_err(|e| Error::Config(format!("invalid MAIL_DEFAULT_SENDER: {e}")))?;

        let builder = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
                .map_err(|e| Error::Config(format!("invalid MAIL_SERVER: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server)
        };
        let mut builder = builder.port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Some(Self {
            transport: Arc::new(builder.build()),
            sender,
        }))
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| Error::BadRequest(format!("invalid recipient {}: {e}", message.to)))?;

        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| Error::External(format!("failed to build mail: {e}")))
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = self.build_message(message)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::External(format!("no runtime for mail delivery: {e}")))?;

        let transport = Arc::clone(&self.transport);
        let to = message.to.clone();
        let subject = message.subject.clone();
        runtime.spawn(async move {
            match transport.send(email).await {
                Ok(_) => info!(to = %to, subject = %subject, "mail delivered"),
                Err(e) => warn!(to = %to, subject = %subject, error = %e, "mail delivery failed"),
            }
        });

        Ok(())
    }
}
