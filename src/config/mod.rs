//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TopicLedgerConfig (validated, immutable)
//!     → operator, ledger client and topic service built from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - The operator private key may live outside the file (environment)

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    MessageConfig, NetworkConfig, ObservabilityConfig, OperatorConfig, TimeoutConfig, TopicConfig,
    TopicLedgerConfig,
};
pub use validation::{validate_config, ValidationError};
