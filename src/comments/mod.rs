//! Comment API backed by a key/value store.
//!
//! # Data Flow
//! ```text
//! GET  <path>?postId=..  → handlers.rs → service.rs::list   → store.rs (list + get)
//! POST <path>            → handlers.rs → service.rs::create → store.rs (put, delete legacy)
//! ```
//!
//! # Storage Layout
//! - `comments:<postId>:<id>`: one JSON comment, expires after the configured TTL
//! - `comments:<postId>`: legacy JSON array, read only when no per-comment
//!   keys exist and removed on the next write

pub mod handlers;
pub mod model;
pub mod service;
pub mod store;

pub use handlers::CommentsApi;
pub use model::{CommentPayload, StoredComment};
pub use service::{CommentError, CommentService};
pub use store::{KvError, KvStore, MemoryKv};
