//! Mitigation lab library.
//!
//! Eight isolated web-vulnerability demos served by one axum server. Each
//! module pairs an intentionally vulnerable route with routes that apply a
//! single named defense.

// Shared plumbing
pub mod config;
pub mod error;
pub mod http;
pub mod mitigation;

// Demo modules
pub mod cmdi;
pub mod idor;
pub mod lfi;
pub mod sqli;
pub mod ssrf;
pub mod upload;
pub mod xss;
pub mod xxe;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::LabConfig;
pub use error::LabError;
pub use http::LabServer;
pub use lifecycle::Shutdown;
