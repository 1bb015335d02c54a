//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated)
//!     → relay::RelaySettings (resolved, shared via ArcSwap)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → server swaps in new RelaySettings
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; an empty file is a valid config
//! - Secrets come from the environment unless given inline

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, AuthMode, ListenerConfig, ObservabilityConfig, RelayConfig, ResponseConfig,
    ResponseMode, UpstreamConfig,
};
pub use validation::ValidationError;
