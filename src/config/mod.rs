//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LabConfig (validated, immutable)
//!     → each module receives its own section via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::LabConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::CommandInjectionConfig;
pub use schema::IdorConfig;
pub use schema::UploadConfig;
pub use schema::LfiConfig;
pub use schema::SqlInjectionConfig;
pub use schema::SsrfConfig;
pub use schema::XssConfig;
pub use schema::XxeConfig;
