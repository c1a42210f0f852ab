// Main entry point for the login-code auth server

use std::sync::Arc;

use anyhow::{Context, Result};
use mailer::{MailerOptions, MailerService};
use otp_service::{MemoryStore, NotificationSender, OtpService};
use server_core::app::{build_app, AppState};
use server_core::sender::MailerSender;
use server_core::session::SessionStore;
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,otp_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting login-code auth server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Wire up the verification core
    let mailer = Arc::new(MailerService::new(MailerOptions {
        api_url: config.mail_api_url.clone(),
        api_key: config.mail_api_key.clone(),
        from_address: config.mail_from_address.clone(),
    }));
    let sender: Arc<dyn NotificationSender> = Arc::new(MailerSender::new(
        mailer,
        config.otp.expiry_window.num_minutes(),
    ));
    let otp = Arc::new(OtpService::new(
        Arc::new(MemoryStore::new()),
        sender,
        config.otp.clone(),
    ));
    let sessions = Arc::new(SessionStore::new());

    // Background reclamation: expired OTP records and stale sessions.
    // Purely housekeeping; expiry itself is enforced on access.
    let sweep_otp = otp.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            let removed = sweep_otp.sweep_expired().await;
            if removed > 0 {
                tracing::debug!("reclaimed {} expired verification records", removed);
            }
        }
    });

    let sweep_sessions = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            sweep_sessions.cleanup_expired().await;
        }
    });

    // Build application
    let app = build_app(AppState { otp, sessions });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
