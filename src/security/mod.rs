//! Security subsystem.
//!
//! Response hardening shared by the secure routes. Request size limits
//! live on the router (see `http::server`).

pub mod headers;

pub use headers::SecureHeaders;
