use anyhow::{Context, Result};
use dotenvy::dotenv;
use otp_service::OtpConfig;
use std::env;

/// Application configuration loaded from environment variables.
///
/// The mail credentials are mandatory and only ever come from the
/// environment or a secret store feeding it.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from_address: String,
    pub otp: OtpConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            mail_api_url: env::var("MAIL_API_URL").context("MAIL_API_URL must be set")?,
            mail_api_key: env::var("MAIL_API_KEY").context("MAIL_API_KEY must be set")?,
            mail_from_address: env::var("MAIL_FROM_ADDRESS")
                .context("MAIL_FROM_ADDRESS must be set")?,
            otp: OtpConfig::from_env()?,
        })
    }
}
