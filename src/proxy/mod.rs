//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → gateway.rs (preflight, service endpoints, comments, route match)
//!     → security (authenticate, rewrite headers)
//!     → rewrite.rs (target URL)
//!     → upstream.rs (one round trip, streamed back)
//!     → error.rs (failures mapped to JSON errors)
//! ```

pub mod error;
pub mod gateway;
pub mod rewrite;
pub mod upstream;

pub use error::GatewayError;
pub use gateway::{BuildError, Gateway};
pub use upstream::{HttpUpstream, Upstream, UpstreamError, UpstreamRequest};
