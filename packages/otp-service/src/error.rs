use thiserror::Error;

/// Transport failure from the notification sender.
///
/// Recoverable: no record was written (issue) or the previous record was left
/// untouched (resend), so the caller may simply retry.
#[derive(Debug, Clone, Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Failure modes of [`OtpService::issue`](crate::OtpService::issue).
#[derive(Debug, Error)]
pub enum IssueError {
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Failure modes of [`OtpService::resend`](crate::OtpService::resend).
#[derive(Debug, Error)]
pub enum ResendError {
    /// No pending code for this identity; resend never acts as a fresh issue.
    #[error("no active verification request")]
    NoActiveRequest,

    /// Too soon since the last send. No state changed, nothing was sent.
    #[error("resend cooldown active, retry in {seconds_remaining}s")]
    CooldownActive { seconds_remaining: i64 },

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
