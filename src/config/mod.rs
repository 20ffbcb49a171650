//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)            env vars + .env.local
//!     → loader.rs (parse)           → env.rs (EnvMap snapshot)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → routing compiles rules against the EnvMap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<Gateway>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - The environment is passed explicitly, never read lazily

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use env::EnvMap;
pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, CommentsConfig, CorsConfig, ForwardingConfig, GatewayConfig, ListenerConfig,
    ObservabilityConfig, RedirectPolicy, RouteConfig, SecurityConfig, ServiceConfig,
    TimeoutConfig,
};
