//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use otp_service::{MemoryStore, NotificationSender, OtpService};

use crate::routes::{
    health_handler, logout_handler, resend_code_handler, send_code_handler, verify_code_handler,
};
use crate::session::SessionStore;

/// Service wiring behind the routes. The sender is a trait object so tests
/// can substitute a stub for the mail client.
pub type AppOtpService = OtpService<Arc<MemoryStore>, Arc<dyn NotificationSender>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub otp: Arc<AppOtpService>,
    pub sessions: Arc<SessionStore>,
}

/// Build the axum application
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/otp/send", post(send_code_handler))
        .route("/auth/otp/verify", post(verify_code_handler))
        .route("/auth/otp/resend", post(resend_code_handler))
        .route("/auth/logout", post(logout_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
}
