//! SkyRoute Gateway library.
//!
//! A single public entry point forwards traffic to a small set of internal
//! services chosen by hostname or path prefix, and serves a few built-in
//! endpoints of its own.

pub mod comments;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;
pub mod service;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::Gateway;
