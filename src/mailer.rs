use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

/// Outbound delivery of single-use tokens to their owners.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation(&self, to: &str, user_id: i64, token: &str) -> anyhow::Result<()>;
    async fn send_password_reset(&self, to: &str, user_id: i64, token: &str)
        -> anyhow::Result<()>;
}

/// Writes deliveries to the log instead of sending mail.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_activation(&self, to: &str, user_id: i64, token: &str) -> anyhow::Result<()> {
        info!(%to, user_id, activation_token = %token, "activation email");
        Ok(())
    }

    async fn send_password_reset(
        &self,
        to: &str,
        user_id: i64,
        token: &str,
    ) -> anyhow::Result<()> {
        info!(%to, user_id, password_reset_token = %token, "password reset email");
        Ok(())
    }
}

pub fn spawn_activation(mailer: Arc<dyn Mailer>, to: String, user_id: i64, token: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send_activation(&to, user_id, &token).await {
            error!(error = %e, user_id, "activation email failed");
        }
    });
}

pub fn spawn_password_reset(mailer: Arc<dyn Mailer>, to: String, user_id: i64, token: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send_password_reset(&to, user_id, &token).await {
            error!(error = %e, user_id, "password reset email failed");
        }
    });
}
