use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use otp_service::{normalize_identity, IssueError, ResendError, VerificationResult};

use crate::app::AppState;
use crate::session::Session;

#[derive(Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct IssueResponse {
    pub issued: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<i64>,
}

impl ErrorResponse {
    fn new(reason: &'static str) -> Self {
        Self {
            reason,
            attempts_remaining: None,
            retry_after_seconds: None,
        }
    }
}

/// Request a login code by email
pub async fn send_code_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Response {
    // Basic shape check; real address validation is the mail provider's job
    if !req.email.contains('@') {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid_email")),
        )
            .into_response();
    }

    match state.otp.issue(&req.email).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(IssueResponse {
                issued: true,
                expires_at: receipt.expires_at,
            }),
        )
            .into_response(),
        Err(IssueError::Delivery(e)) => {
            tracing::error!("failed to deliver login code: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("delivery_failed")),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifiedResponse {
    pub token: String,
}

/// Submit a login code; mints a session on success
pub async fn verify_code_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Response {
    match state.otp.verify(&req.email, &req.code).await {
        VerificationResult::Success => {
            let token = state
                .sessions
                .create_session(Session {
                    // Session key follows the core's identity policy exactly
                    email: normalize_identity(&req.email),
                    authenticated: true,
                    created_at: Utc::now(),
                })
                .await;
            (StatusCode::OK, Json(VerifiedResponse { token })).into_response()
        }
        VerificationResult::Mismatch { attempts_remaining } => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                attempts_remaining: Some(attempts_remaining),
                ..ErrorResponse::new("mismatch")
            }),
        )
            .into_response(),
        VerificationResult::NoActiveRequest => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("no_active_request")),
        )
            .into_response(),
        VerificationResult::Expired => {
            (StatusCode::GONE, Json(ErrorResponse::new("expired"))).into_response()
        }
        VerificationResult::AttemptsExhausted => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new("attempts_exhausted")),
        )
            .into_response(),
    }
}

/// Ask for the pending code to be sent again
pub async fn resend_code_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Response {
    match state.otp.resend(&req.email).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(IssueResponse {
                issued: true,
                expires_at: receipt.expires_at,
            }),
        )
            .into_response(),
        Err(ResendError::NoActiveRequest) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("no_active_request")),
        )
            .into_response(),
        Err(ResendError::CooldownActive { seconds_remaining }) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                retry_after_seconds: Some(seconds_remaining),
                ..ErrorResponse::new("cooldown_active")
            }),
        )
            .into_response(),
        Err(ResendError::Delivery(e)) => {
            tracing::error!("failed to redeliver login code: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("delivery_failed")),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

/// Logout (delete session)
pub async fn logout_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<LogoutRequest>,
) -> (StatusCode, Json<LogoutResponse>) {
    state.sessions.delete_session(&req.token).await;
    (StatusCode::OK, Json(LogoutResponse { ok: true }))
}
