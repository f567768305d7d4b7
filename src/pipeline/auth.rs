//! Authorization middleware
//!
//! Declarative prefix-based protection: a request whose path falls under a
//! protected prefix must carry the configured credential header. Everything
//! else passes through untouched.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::AuthConfig;
use crate::http;
use crate::logger;

/// Decide whether a request may proceed to its endpoint
///
/// `credential` is the value of the configured auth header, when present.
#[must_use]
pub fn authorize(path: &str, credential: Option<&str>, cfg: &AuthConfig) -> bool {
    let protected = cfg
        .protected_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()));
    if !protected {
        return true;
    }

    match credential {
        Some(value) if !value.is_empty() => match &cfg.token {
            Some(token) => value == token,
            None => true,
        },
        _ => false,
    }
}

/// Response for a denied request: redirect to the login path when one is
/// configured, plain 403 otherwise
pub fn deny_response(path: &str, cfg: &AuthConfig) -> Response<Full<Bytes>> {
    logger::log_warning(&format!("Unauthorized request to protected path: {path}"));
    match &cfg.login_path {
        Some(login) => http::build_redirect_response(login),
        None => http::build_403_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with(prefixes: &[&str], token: Option<&str>) -> AuthConfig {
        AuthConfig {
            protected_prefixes: prefixes.iter().map(ToString::to_string).collect(),
            token: token.map(ToString::to_string),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn unprotected_paths_always_pass() {
        let cfg = cfg_with(&["/admin"], None);
        assert!(authorize("/", None, &cfg));
        assert!(authorize("/about", None, &cfg));
    }

    #[test]
    fn protected_prefix_requires_credential() {
        let cfg = cfg_with(&["/admin"], None);
        assert!(!authorize("/admin", None, &cfg));
        assert!(!authorize("/admin/users", Some(""), &cfg));
        assert!(authorize("/admin/users", Some("anything"), &cfg));
    }

    #[test]
    fn configured_token_must_match_exactly() {
        let cfg = cfg_with(&["/admin"], Some("Bearer s3cret"));
        assert!(authorize("/admin", Some("Bearer s3cret"), &cfg));
        assert!(!authorize("/admin", Some("Bearer wrong"), &cfg));
        assert!(!authorize("/admin", None, &cfg));
    }

    #[test]
    fn denial_redirects_when_login_path_configured() {
        let mut cfg = cfg_with(&["/admin"], None);
        cfg.login_path = Some("/login".to_string());
        let resp = deny_response("/admin", &cfg);
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get("Location").unwrap(), "/login");
    }

    #[test]
    fn denial_is_403_without_login_path() {
        let cfg = cfg_with(&["/admin"], None);
        let resp = deny_response("/admin", &cfg);
        assert_eq!(resp.status(), 403);
    }
}
