use async_trait::async_trait;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Delivers verification links to freshly registered users. Delivery is a
/// side channel: the account row is the source of truth, so a failed send is
/// logged by the caller and never rolls anything back.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), MailerError>;
}

/// Mailer for deployments without an SMTP relay: writes the verification
/// link to the log so an operator can hand it out manually.
pub struct LogMailer {
    public_url: String,
}

impl LogMailer {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
        }
    }

    fn verification_link(&self, token: &str) -> String {
        format!(
            "{}/v1/auth/verify-email?token={}",
            self.public_url.trim_end_matches('/'),
            token
        )
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &str, token: &str) -> Result<(), MailerError> {
        info!(
            "Verification link for {}: {}",
            to,
            self.verification_link(token)
        );

        Ok(())
    }
}
