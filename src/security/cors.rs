//! CORS headers for browser callers.

use axum::http::header::{
    HeaderMap, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};

use crate::config::CorsConfig;
use crate::security::{HeaderSet, InvalidHeader};

/// CORS headers attached to every response the gateway emits.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    headers: HeaderSet,
}

impl CorsPolicy {
    /// Build from config. A disabled policy writes nothing.
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeader> {
        let mut headers = HeaderSet::new();
        if config.enabled {
            headers.push(ACCESS_CONTROL_ALLOW_ORIGIN, &config.allow_origin)?;
            headers.push(ACCESS_CONTROL_ALLOW_METHODS, &config.allow_methods)?;
            headers.push(ACCESS_CONTROL_ALLOW_HEADERS, &config.allow_headers)?;
        }
        Ok(Self { headers })
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        self.headers.apply(headers);
    }

    pub fn is_enabled(&self) -> bool {
        !self.headers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_any_origin() {
        let policy = CorsPolicy::from_config(&CorsConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, "https://upstream.example".parse().unwrap());

        policy.apply(&mut headers);

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert!(headers.contains_key(ACCESS_CONTROL_ALLOW_HEADERS));
    }

    #[test]
    fn test_disabled_policy_writes_nothing() {
        let config = CorsConfig {
            enabled: false,
            ..Default::default()
        };
        let policy = CorsPolicy::from_config(&config).unwrap();
        let mut headers = HeaderMap::new();
        policy.apply(&mut headers);

        assert!(!policy.is_enabled());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_rejects_invalid_value() {
        let config = CorsConfig {
            allow_origin: "bad\nvalue".into(),
            ..Default::default()
        };
        assert!(CorsPolicy::from_config(&config).is_err());
    }
}
