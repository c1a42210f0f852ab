use anyhow::{Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;

/// Tuning knobs for the verification lifecycle.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Digits in a generated code.
    pub code_length: usize,
    /// Time-to-live measured from issuance.
    pub expiry_window: Duration,
    /// Failed verifications allowed before the record is invalidated.
    pub max_attempts: u32,
    /// Minimum spacing between sends to one identity.
    pub resend_cooldown: Duration,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            expiry_window: Duration::minutes(5),
            max_attempts: 3,
            resend_cooldown: Duration::seconds(60),
        }
    }
}

impl OtpConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();
        Ok(Self {
            code_length: env_or("OTP_CODE_LENGTH", defaults.code_length)?,
            expiry_window: Duration::seconds(env_or(
                "OTP_EXPIRY_SECONDS",
                defaults.expiry_window.num_seconds(),
            )?),
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts)?,
            resend_cooldown: Duration::seconds(env_or(
                "OTP_RESEND_COOLDOWN_SECONDS",
                defaults.resend_cooldown.num_seconds(),
            )?),
        })
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OtpConfig::default();
        assert_eq!(config.code_length, 6);
        assert_eq!(config.expiry_window, Duration::minutes(5));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.resend_cooldown, Duration::seconds(60));
    }
}
