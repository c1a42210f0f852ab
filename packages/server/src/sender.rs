//! Adapter wiring the mail client into the verification core's sender seam.

use std::sync::Arc;

use async_trait::async_trait;
use mailer::MailerService;
use otp_service::{DeliveryError, NotificationSender};

/// Wrapper around MailerService that implements NotificationSender
pub struct MailerSender {
    mailer: Arc<MailerService>,
    code_ttl_minutes: i64,
}

impl MailerSender {
    pub fn new(mailer: Arc<MailerService>, code_ttl_minutes: i64) -> Self {
        Self {
            mailer,
            code_ttl_minutes,
        }
    }
}

#[async_trait]
impl NotificationSender for MailerSender {
    async fn send(&self, identity: &str, code: &str) -> Result<(), DeliveryError> {
        self.mailer
            .send_code(identity, code, self.code_ttl_minutes)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError(e.to_string()))
    }
}
