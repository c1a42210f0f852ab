// Login Code Auth Server
//
// Thin HTTP surface over the OTP verification core: request a code, submit a
// code, resend, logout. Successful verification mints an in-memory session.

pub mod app;
pub mod config;
pub mod routes;
pub mod sender;
pub mod session;

pub use config::Config;
