//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → request.rs (reconstruct the caller's URL)
//!     → proxy::Gateway (dispatch)
//!     → response.rs (gateway-generated JSON bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundUrl, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
