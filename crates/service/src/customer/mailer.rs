//! Outbound mail used by the verification workflow.

use async_trait::async_trait;
use configs::SmtpConfig;
use lettre::{
    message::header::ContentType,
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::info;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn verification(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Email Verification".to_string(),
            body: format!("Please verify your email by clicking on the following link: {link}"),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// SMTP delivery through STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Build the transport; no connection is opened until the first send.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(config.username.clone(), config.password.clone()));
        }
        Ok(Self { transport: builder.build(), from_address: config.from_address.clone() })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(mail.to.parse().map_err(|_| MailError::InvalidAddress(mail.to.clone()))?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        self.transport.send(message).await?;
        info!(to = %mail.to, subject = %mail.subject, "email sent");
        Ok(())
    }
}

/// Used when no SMTP relay is configured: records the dispatch in the log
/// and reports success.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "smtp not configured; email not delivered");
        Ok(())
    }
}

/// Recording mailer for tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        failing: AtomicBool,
    }

    impl RecordingMailer {
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<OutgoingMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(MailError::InvalidAddress(mail.to));
            }
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_mail_embeds_link() {
        let mail = OutgoingMail::verification("a@x.com", "http://localhost:8080/verify-email?token=abc");
        assert_eq!(mail.to, "a@x.com");
        assert!(mail.body.ends_with("http://localhost:8080/verify-email?token=abc"));
    }

    #[tokio::test]
    async fn smtp_mailer_builds_without_connecting() {
        let cfg = SmtpConfig {
            host: "smtp.example.com".into(),
            port: 2525,
            username: "user".into(),
            password: "pw".into(),
            from_address: "no-reply@example.com".into(),
        };
        assert!(SmtpMailer::new(&cfg).is_ok());
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_bad_recipient_before_dialing() {
        let cfg = SmtpConfig {
            host: "smtp.example.com".into(),
            port: 2525,
            username: String::new(),
            password: String::new(),
            from_address: "no-reply@example.com".into(),
        };
        let mailer = SmtpMailer::new(&cfg).expect("build");
        let err = mailer.send(OutgoingMail::verification("not an address", "l")).await.unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
    }
}
