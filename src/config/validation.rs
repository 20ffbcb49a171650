//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Each route has exactly one match predicate
//! - Validate value ranges (limits > 0, known protocols)
//! - Detect duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Missing target hosts are NOT errors here; they surface per request as 503

use std::collections::HashSet;

use crate::config::schema::{GatewayConfig, RouteConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("route #{index} has no name")]
    UnnamedRoute { index: usize },

    #[error("duplicate route name '{0}'")]
    DuplicateRoute(String),

    #[error("route '{0}' must set exactly one of host or path_prefix")]
    AmbiguousMatch(String),

    #[error("route '{route}' path '{path}' must start with '/'")]
    RelativePath { route: String, path: String },

    #[error("route '{route}' has unsupported protocol '{protocol}'")]
    UnsupportedProtocol { route: String, protocol: String },

    #[error("comments.{0} must be greater than zero")]
    ZeroCommentLimit(&'static str),

    #[error("comments.path must start with '/'")]
    RelativeCommentsPath,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Check the whole configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.is_empty() {
            errors.push(ValidationError::UnnamedRoute { index });
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        validate_route(route, &mut errors);
    }

    if config.comments.path.is_empty() || !config.comments.path.starts_with('/') {
        errors.push(ValidationError::RelativeCommentsPath);
    }
    if config.comments.max_content_chars == 0 {
        errors.push(ValidationError::ZeroCommentLimit("max_content_chars"));
    }
    if config.comments.list_limit == 0 {
        errors.push(ValidationError::ZeroCommentLimit("list_limit"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    let has_host = route.host.as_deref().is_some_and(|h| !h.is_empty());
    let has_prefix = route.path_prefix.as_deref().is_some_and(|p| !p.is_empty());
    if has_host == has_prefix {
        errors.push(ValidationError::AmbiguousMatch(route.name.clone()));
    }

    for path in [&route.path_prefix, &route.strip_prefix].into_iter().flatten() {
        if !path.is_empty() && !path.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                route: route.name.clone(),
                path: path.clone(),
            });
        }
    }

    if let Some(protocol) = &route.target_protocol {
        if !is_supported_protocol(protocol) {
            errors.push(ValidationError::UnsupportedProtocol {
                route: route.name.clone(),
                protocol: protocol.clone(),
            });
        }
    }
}

/// Protocols the upstream transport can speak.
pub fn is_supported_protocol(protocol: &str) -> bool {
    matches!(
        protocol.trim_end_matches(':').to_ascii_lowercase().as_str(),
        "http" | "https"
    )
}
