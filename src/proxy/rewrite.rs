//! Outbound URL construction.

use url::Url;

use crate::http::request::InboundUrl;
use crate::routing::Target;

/// Remove `base` from the front of `path`. A base of `/` leaves the path
/// untouched; stripping everything yields `/`.
pub fn strip_base_path(path: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }

    match path.strip_prefix(base) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        Some(rest) => format!("/{}", rest),
        None => path.to_string(),
    }
}

/// Copy the inbound URL onto the target: scheme, host and port replaced,
/// path stripped of `base`, query kept verbatim.
pub fn build_target_url(
    inbound: &InboundUrl,
    target: &Target,
    base: &str,
) -> Result<Url, url::ParseError> {
    let hostname = target.hostname().unwrap_or_default();

    let mut url = Url::parse(&format!("{}://localhost/", target.protocol))?;
    url.set_host(Some(&hostname))?;
    url.set_port(target.effective_port())
        .map_err(|_| url::ParseError::InvalidPort)?;
    url.set_path(&strip_base_path(&inbound.path, base));
    url.set_query(inbound.query.as_deref());
    Ok(url)
}
