// End-to-end tests for the OTP verification lifecycle, using a recording
// sender double to capture delivered codes and the store seam to backdate
// timestamps instead of mocking the clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;

use otp_service::{
    DeliveryError, IssueError, MemoryStore, NotificationSender, OtpConfig, OtpService,
    RecordStore, ResendError, VerificationResult,
};

/// Test double that records every delivery and can be told to fail.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    fail_next: AtomicBool,
}

impl RecordingSender {
    async fn last_code(&self) -> String {
        let sent = self.sent.lock().await;
        sent.last().expect("no code was sent").1.clone()
    }

    async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    fn fail_next_send(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, identity: &str, code: &str) -> Result<(), DeliveryError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DeliveryError("smtp unreachable".to_string()));
        }
        let mut sent = self.sent.lock().await;
        sent.push((identity.to_string(), code.to_string()));
        Ok(())
    }
}

type TestService = OtpService<Arc<MemoryStore>, Arc<RecordingSender>>;

fn service() -> (Arc<MemoryStore>, Arc<RecordingSender>, TestService) {
    service_with(OtpConfig::default())
}

fn service_with(config: OtpConfig) -> (Arc<MemoryStore>, Arc<RecordingSender>, TestService) {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(RecordingSender::default());
    let svc = OtpService::new(store.clone(), sender.clone(), config);
    (store, sender, svc)
}

/// Shift a record's timestamps into the past through the store seam.
async fn backdate(store: &MemoryStore, identity: &str, by: Duration) {
    let mut record = store.get(identity).await.expect("record should exist");
    record.issued_at -= by;
    record.last_sent_at -= by;
    store.put(record).await;
}

#[tokio::test]
async fn test_issued_code_verifies_exactly_once() {
    let (_, sender, svc) = service();

    let receipt = svc.issue("user@example.com").await.unwrap();
    assert_eq!(receipt.identity, "user@example.com");
    let code = sender.last_code().await;

    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::Success
    );
    // Consumed: the same code never succeeds twice.
    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::NoActiveRequest
    );
}

#[tokio::test]
async fn test_delivered_codes_are_fixed_length_digits() {
    let config = OtpConfig {
        code_length: 8,
        ..OtpConfig::default()
    };
    let (_, sender, svc) = service_with(config);

    svc.issue("user@example.com").await.unwrap();
    let code = sender.last_code().await;
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_verify_without_issue_is_no_active_request() {
    let (_, _, svc) = service();
    assert_eq!(
        svc.verify("nobody@example.com", "123456").await,
        VerificationResult::NoActiveRequest
    );
}

#[tokio::test]
async fn test_correct_code_after_expiry_window_is_rejected() {
    let (store, sender, svc) = service();

    svc.issue("user@example.com").await.unwrap();
    let code = sender.last_code().await;
    backdate(&store, "user@example.com", Duration::minutes(5) + Duration::seconds(1)).await;

    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::Expired
    );
    // The record was deleted on expiry detection.
    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::NoActiveRequest
    );
}

#[tokio::test]
async fn test_wrong_codes_count_down_then_exhaust() {
    let (_, sender, svc) = service();

    svc.issue("user@example.com").await.unwrap();
    let code = sender.last_code().await;
    let wrong = if code == "000000" { "000001" } else { "000000" };

    assert_eq!(
        svc.verify("user@example.com", wrong).await,
        VerificationResult::Mismatch {
            attempts_remaining: 2
        }
    );
    assert_eq!(
        svc.verify("user@example.com", wrong).await,
        VerificationResult::Mismatch {
            attempts_remaining: 1
        }
    );
    assert_eq!(
        svc.verify("user@example.com", wrong).await,
        VerificationResult::AttemptsExhausted
    );
    assert_eq!(
        svc.verify("user@example.com", wrong).await,
        VerificationResult::NoActiveRequest
    );
    // Even the right code is dead after exhaustion.
    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::NoActiveRequest
    );
}

#[tokio::test]
async fn test_resend_inside_cooldown_changes_nothing() {
    let (_, sender, svc) = service();

    svc.issue("user@example.com").await.unwrap();
    let code = sender.last_code().await;

    match svc.resend("user@example.com").await {
        Err(ResendError::CooldownActive { seconds_remaining }) => {
            assert!(seconds_remaining > 0 && seconds_remaining <= 60);
        }
        other => panic!("expected CooldownActive, got {:?}", other.map(|r| r.identity)),
    }

    // No send happened and the original code still works.
    assert_eq!(sender.sent_count().await, 1);
    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::Success
    );
}

#[tokio::test]
async fn test_resend_after_cooldown_invalidates_old_code() {
    let (store, sender, svc) = service();

    svc.issue("user@example.com").await.unwrap();
    let old_code = sender.last_code().await;
    backdate(&store, "user@example.com", Duration::seconds(61)).await;

    svc.resend("user@example.com").await.unwrap();
    let new_code = sender.last_code().await;
    assert_eq!(sender.sent_count().await, 2);

    // The old code can never succeed again.
    if old_code != new_code {
        assert!(matches!(
            svc.verify("user@example.com", &old_code).await,
            VerificationResult::Mismatch { .. }
        ));
    }
    assert_eq!(
        svc.verify("user@example.com", &new_code).await,
        VerificationResult::Success
    );
}

#[tokio::test]
async fn test_resend_without_pending_record_is_rejected() {
    let (_, sender, svc) = service();

    assert!(matches!(
        svc.resend("nobody@example.com").await,
        Err(ResendError::NoActiveRequest)
    ));
    assert_eq!(sender.sent_count().await, 0);
}

#[tokio::test]
async fn test_reissue_replaces_prior_code() {
    let (store, sender, svc) = service();

    svc.issue("user@example.com").await.unwrap();
    let first = sender.last_code().await;

    svc.issue("user@example.com").await.unwrap();
    let second = sender.last_code().await;

    // One live record per identity: the fresh code wins.
    let record = store.get("user@example.com").await.unwrap();
    assert_eq!(record.code, second);
    assert_eq!(record.attempts, 0);

    if first != second {
        assert!(matches!(
            svc.verify("user@example.com", &first).await,
            VerificationResult::Mismatch { .. }
        ));
    }
    assert_eq!(
        svc.verify("user@example.com", &second).await,
        VerificationResult::Success
    );
}

#[tokio::test]
async fn test_failed_delivery_on_issue_leaves_no_record() {
    let (store, sender, svc) = service();

    sender.fail_next_send();
    assert!(matches!(
        svc.issue("user@example.com").await,
        Err(IssueError::Delivery(_))
    ));
    assert!(store.get("user@example.com").await.is_none());
}

#[tokio::test]
async fn test_failed_delivery_on_resend_keeps_previous_record() {
    let (store, sender, svc) = service();

    svc.issue("user@example.com").await.unwrap();
    let code = sender.last_code().await;
    backdate(&store, "user@example.com", Duration::seconds(61)).await;

    sender.fail_next_send();
    assert!(matches!(
        svc.resend("user@example.com").await,
        Err(ResendError::Delivery(_))
    ));

    // The undelivered code must not replace the one the user holds.
    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::Success
    );
}

#[tokio::test]
async fn test_identity_is_case_insensitive() {
    let (_, sender, svc) = service();

    svc.issue("User@Example.COM").await.unwrap();
    let code = sender.last_code().await;

    assert_eq!(
        svc.verify("user@example.com", &code).await,
        VerificationResult::Success
    );
}

#[tokio::test]
async fn test_sweep_reclaims_only_expired_records() {
    let (store, _, svc) = service();

    svc.issue("stale@example.com").await.unwrap();
    svc.issue("fresh@example.com").await.unwrap();
    backdate(&store, "stale@example.com", Duration::minutes(6)).await;

    assert_eq!(svc.sweep_expired().await, 1);
    assert!(store.get("stale@example.com").await.is_none());
    assert!(store.get("fresh@example.com").await.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wrong_attempts_never_undercount() {
    let (store, sender, svc) = service();
    let svc = Arc::new(svc);

    svc.issue("user@example.com").await.unwrap();
    let code = sender.last_code().await;
    let wrong = if code == "000000" { "000001" } else { "000000" };

    // Two concurrent wrong submissions: below the limit, so the record
    // survives with attempts == 2 exactly.
    let mut handles = Vec::new();
    for _ in 0..2 {
        let svc = svc.clone();
        let wrong = wrong.to_string();
        handles.push(tokio::spawn(async move {
            svc.verify("user@example.com", &wrong).await
        }));
    }
    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            VerificationResult::Mismatch { .. }
        ));
    }
    let record = store.get("user@example.com").await.unwrap();
    assert_eq!(record.attempts, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wrong_attempts_past_limit_exhaust_once() {
    let (store, sender, svc) = service();
    let svc = Arc::new(svc);

    svc.issue("user@example.com").await.unwrap();
    let code = sender.last_code().await;
    let wrong = if code == "000000" { "000001" } else { "000000" };

    let mut handles = Vec::new();
    for _ in 0..5 {
        let svc = svc.clone();
        let wrong = wrong.to_string();
        handles.push(tokio::spawn(async move {
            svc.verify("user@example.com", &wrong).await
        }));
    }

    let mut mismatches = 0;
    let mut exhausted = 0;
    let mut gone = 0;
    for handle in handles {
        match handle.await.unwrap() {
            VerificationResult::Mismatch { .. } => mismatches += 1,
            VerificationResult::AttemptsExhausted => exhausted += 1,
            VerificationResult::NoActiveRequest => gone += 1,
            other => panic!("unexpected result {:?}", other),
        }
    }

    // Exactly max_attempts - 1 mismatches, one exhaustion, and the stragglers
    // see no record. attempts == min(N, max_attempts) with no skipped values.
    assert_eq!(mismatches, 2);
    assert_eq!(exhausted, 1);
    assert_eq!(gone, 2);
    assert!(store.get("user@example.com").await.is_none());
}
