// Thin client for a transactional email HTTP API (Mailgun-style messages
// endpoint). Credentials come in through MailerOptions at construction time,
// never from literals in code.

use std::collections::HashMap;

use reqwest::Client;
use thiserror::Error;

pub mod models;

use crate::models::SendReceipt;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("mail API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct MailerOptions {
    /// Full URL of the provider's send endpoint.
    pub api_url: String,
    pub api_key: String,
    /// Sender address shown to the recipient.
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct MailerService {
    options: MailerOptions,
    client: Client,
}

impl MailerService {
    pub fn new(options: MailerOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Deliver a verification code to `recipient`.
    ///
    /// `valid_minutes` only feeds the message text; the actual expiry is
    /// enforced by the verification service, not by this client.
    pub async fn send_code(
        &self,
        recipient: &str,
        code: &str,
        valid_minutes: i64,
    ) -> Result<SendReceipt, MailerError> {
        let mut form_body: HashMap<&str, String> = HashMap::new();
        form_body.insert("from", self.options.from_address.clone());
        form_body.insert("to", recipient.to_string());
        form_body.insert("subject", "Your verification code".to_string());
        form_body.insert(
            "text",
            format!(
                "Your verification code is: {}\nIt expires in {} minutes.",
                code, valid_minutes
            ),
        );

        let response = self
            .client
            .post(&self.options.api_url)
            .basic_auth("api", Some(&self.options.api_key))
            .form(&form_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<SendReceipt>().await?)
    }
}
