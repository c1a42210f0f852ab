//! The verification state machine.
//!
//! One record per identity, moving through a single pending state:
//!
//! ```text
//!   [no record] --issue--> [pending] --matching verify--> [no record]
//!   [pending] --expiry elapsed on any verify--> [no record] (Expired)
//!   [pending] --attempts reach max--> [no record] (AttemptsExhausted)
//!   [pending] --issue/resend--> [pending] (new code, counters reset)
//! ```
//!
//! Expiry is lazy: nothing fires when the window lapses, the next access
//! observes it. `sweep_expired` exists only to reclaim memory from records
//! nobody came back for.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::code::{generate_code, identity_digest};
use crate::config::OtpConfig;
use crate::error::{DeliveryError, IssueError, ResendError};
use crate::notify::NotificationSender;
use crate::record::VerificationRecord;
use crate::store::RecordStore;

/// Outcome of a verification attempt. Always a structured result, never a
/// fault: every variant is a normal answer the auth layer must handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    /// Code matched. The record is consumed; the same code can never
    /// succeed twice.
    Success,
    /// No code was issued, or it was already consumed or invalidated.
    NoActiveRequest,
    /// The expiry window lapsed. The record is gone; the user must re-request.
    Expired,
    /// Too many wrong guesses. The record is gone; the user must re-request.
    AttemptsExhausted,
    /// Wrong code, tries remain. The user may retry immediately.
    Mismatch { attempts_remaining: u32 },
}

/// Confirmation that a code was issued and delivered. Deliberately does not
/// carry the code itself.
#[derive(Debug, Clone)]
pub struct IssueReceipt {
    pub identity: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// OTP issuance/verification service.
///
/// Generic over its two seams: where records live and how codes reach the
/// user. All public operations normalize the identity to lowercase first.
pub struct OtpService<S, N> {
    store: S,
    sender: N,
    config: OtpConfig,
    // Serializes every check-then-act sequence across all identities. A
    // single lock is enough at this scale. It stays held across the sender
    // call during issue/resend: no interleaving at all between the cooldown
    // check, the send, and the record write.
    lock: Mutex<()>,
}

impl<S, N> OtpService<S, N>
where
    S: RecordStore,
    N: NotificationSender,
{
    pub fn new(store: S, sender: N, config: OtpConfig) -> Self {
        Self {
            store,
            sender,
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Generate and deliver a fresh code, replacing any prior record for this
    /// identity. On delivery failure no record is written: a code the user
    /// never received must not lock them out.
    pub async fn issue(&self, identity: &str) -> Result<IssueReceipt, IssueError> {
        let identity = normalize_identity(identity);
        let _guard = self.lock.lock().await;
        Ok(self.reissue(identity).await?)
    }

    /// Check a submitted code against the pending record.
    ///
    /// Decision order: existence, expiry, exhaustion, match. The whole
    /// sequence runs under the service lock, so two concurrent calls for one
    /// identity can neither both succeed nor corrupt the attempt counter.
    pub async fn verify(&self, identity: &str, submitted_code: &str) -> VerificationResult {
        let identity = normalize_identity(identity);
        let _guard = self.lock.lock().await;

        let Some(mut record) = self.store.get(&identity).await else {
            return VerificationResult::NoActiveRequest;
        };

        let now = Utc::now();
        if now.signed_duration_since(record.issued_at) > self.config.expiry_window {
            self.store.delete(&identity).await;
            info!(identity = %identity_digest(&identity), "verification code expired");
            return VerificationResult::Expired;
        }

        if record.attempts >= self.config.max_attempts {
            self.store.delete(&identity).await;
            return VerificationResult::AttemptsExhausted;
        }

        if codes_match(submitted_code, &record.code) {
            self.store.delete(&identity).await;
            info!(identity = %identity_digest(&identity), "verification succeeded");
            return VerificationResult::Success;
        }

        record.attempts += 1;
        if record.attempts >= self.config.max_attempts {
            self.store.delete(&identity).await;
            warn!(
                identity = %identity_digest(&identity),
                "verification attempts exhausted"
            );
            return VerificationResult::AttemptsExhausted;
        }

        let attempts_remaining = self.config.max_attempts - record.attempts;
        self.store.put(record).await;
        VerificationResult::Mismatch { attempts_remaining }
    }

    /// Re-deliver a code for an identity that already has a pending record.
    ///
    /// Gated by the cooldown measured from the last send; inside it, nothing
    /// changes and nothing is sent. Past it, this is a full reissue: new
    /// code, counters reset. A resend with no pending record is rejected
    /// rather than silently acting as a fresh issue.
    pub async fn resend(&self, identity: &str) -> Result<IssueReceipt, ResendError> {
        let identity = normalize_identity(identity);
        let _guard = self.lock.lock().await;

        let Some(record) = self.store.get(&identity).await else {
            return Err(ResendError::NoActiveRequest);
        };

        let since_last_send = Utc::now().signed_duration_since(record.last_sent_at);
        if since_last_send < self.config.resend_cooldown {
            let seconds_remaining = (self.config.resend_cooldown - since_last_send)
                .num_seconds()
                .max(1);
            return Err(ResendError::CooldownActive { seconds_remaining });
        }

        Ok(self.reissue(identity).await?)
    }

    /// Drop records past the expiry window. Optional memory reclamation;
    /// observable behavior is identical with or without it.
    pub async fn sweep_expired(&self) -> usize {
        let _guard = self.lock.lock().await;
        self.store.sweep_older_than(self.config.expiry_window).await
    }

    /// Shared issue/resend path. Caller holds the lock. Send first, write
    /// second: a delivery failure leaves any previous record (and its
    /// cooldown clock) untouched.
    async fn reissue(&self, identity: String) -> Result<IssueReceipt, DeliveryError> {
        let code = generate_code(self.config.code_length);

        self.sender.send(&identity, &code).await.map_err(|e| {
            warn!(identity = %identity_digest(&identity), "code delivery failed: {}", e);
            e
        })?;

        let now = Utc::now();
        self.store
            .put(VerificationRecord::new(identity.clone(), code, now))
            .await;

        info!(identity = %identity_digest(&identity), "verification code issued");
        Ok(IssueReceipt {
            identity,
            issued_at: now,
            expires_at: now + self.config.expiry_window,
        })
    }
}

/// Fixed case policy: identities are compared lowercase. Public so callers
/// keying their own state on the identity (sessions, audit) stay consistent
/// with the verification key.
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_ascii_lowercase()
}

/// Constant-time code comparison. `ct_eq` on slices already short-circuits
/// only on length, which is public anyway.
fn codes_match(submitted: &str, stored: &str) -> bool {
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}
