//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (rule lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched RouteRule or None
//!
//! Route Compilation (at startup / reload):
//!     RouteConfig[] + EnvMap
//!     → Resolve targets from env
//!     → Split host rules from prefix rules, sort by priority
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins

pub mod matcher;
pub mod router;

pub use matcher::{HostMatcher, Matcher, PathPrefixMatcher, RequestTarget};
pub use router::{MatchKind, RouteRule, Router, Target};
