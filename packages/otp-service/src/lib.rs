// OTP Verification Service
//
// Owns the per-identity verification lifecycle: issue a code, deliver it
// through a pluggable notification sender, verify submissions against it with
// expiry and attempt limits, and gate resends behind a cooldown. The auth
// layer consuming this crate only ever sees structured results; codes are
// never returned to callers or written to logs.

pub mod code;
pub mod config;
pub mod error;
pub mod notify;
pub mod record;
pub mod service;
pub mod store;

pub use code::{generate_code, identity_digest};
pub use config::OtpConfig;
pub use error::{DeliveryError, IssueError, ResendError};
pub use notify::NotificationSender;
pub use record::VerificationRecord;
pub use service::{normalize_identity, IssueReceipt, OtpService, VerificationResult};
pub use store::{MemoryStore, RecordStore};
