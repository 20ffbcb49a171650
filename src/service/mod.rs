//! Built-in endpoints served on control hosts.
//!
//! # Responsibilities
//! - `GET /`: redirect to the frontend, or describe the gateway
//! - `GET /health` and `GET /healthcheck` for uptime monitors
//! - `GET /favicon.ico` answered empty so browsers stop asking
//!
//! # Design Decisions
//! - Only configured control hosts get these; every other host is routed
//! - A frontend URL that resolves to the current request is not followed
//!   unless the redirect policy says `always`

pub mod endpoints;

pub use endpoints::ServiceEndpoints;
