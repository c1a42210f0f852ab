use chrono::{DateTime, Utc};

/// A live OTP issuance for one identity.
///
/// At most one record exists per identity at a time; a new issuance always
/// replaces any prior record. Expiry is measured from `issued_at`, the resend
/// cooldown from `last_sent_at` (the two are set together on issue/resend but
/// are distinct fields on purpose).
#[derive(Debug, Clone)]
pub struct VerificationRecord {
    /// Lowercased email address keying this record.
    pub identity: String,
    /// The plaintext code. Lives only inside the store, only while pending.
    pub code: String,
    pub issued_at: DateTime<Utc>,
    /// Failed verification attempts since issuance.
    pub attempts: u32,
    pub last_sent_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// Fresh record for a just-delivered code.
    pub fn new(identity: String, code: String, now: DateTime<Utc>) -> Self {
        Self {
            identity,
            code,
            issued_at: now,
            attempts: 0,
            last_sent_at: now,
        }
    }
}
