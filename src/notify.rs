use async_trait::async_trait;
use tracing::info;

/// Out-of-band delivery of account messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, email: &str, token: &str) -> anyhow::Result<()>;
}

/// Default mailer when no transport is configured: records the request, never the token.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &str, _token: &str) -> anyhow::Result<()> {
        info!(to = %email, "password reset requested; no mail transport configured");
        Ok(())
    }
}
