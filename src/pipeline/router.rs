//! Pipeline entry point
//!
//! Drives the fixed middleware order for each request: method validation,
//! static file lookup, routing, authorization, endpoint dispatch. The fault
//! wrapper sits outermost: dispatch errors become a redirect to the error
//! page in production, a diagnostic response in development.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::{Method, Request, Response, Version};

use crate::config::{AppState, Config};
use crate::health;
use crate::http;
use crate::logger;
use crate::pages;
use crate::pipeline::{auth, static_files, DispatchError};

/// Request context carried through the pipeline steps
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    /// Value of the configured auth header, when present
    pub credential: Option<String>,
}

/// Endpoint resolved by the routing step
#[derive(Debug, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Health,
    ErrorPage,
    Page(&'a str),
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let version = version_label(req.version());

    let mut response = if let Some(resp) = check_http_method(&method, state.config.http.enable_cors) {
        resp
    } else if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        resp
    } else {
        let ctx = RequestContext {
            path: &path,
            is_head: method == Method::HEAD,
            if_none_match: header_value(&req, "if-none-match"),
            credential: header_value(&req, &state.config.auth.header),
        };

        match dispatch(&ctx, &state).await {
            Ok(resp) => resp,
            // Outermost fault wrapper
            Err(fault) => fault_response(&fault, &state.config),
        }
    };

    http::response::set_server_header(&mut response, &state.config.http.server_name);

    if state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed)
    {
        let mut entry = logger::AccessLogEntry::new(
            peer_addr.ip().to_string(),
            method.to_string(),
            path.clone(),
        );
        entry.query = query;
        entry.http_version = version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header_value(&req, "referer");
        entry.user_agent = header_value(&req, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the middleware chain after method and body validation
pub async fn dispatch(
    ctx: &RequestContext<'_>,
    state: &Arc<AppState>,
) -> Result<Response<Full<Bytes>>, DispatchError> {
    let cfg = &state.config;

    // 1. Static files are attempted before routing
    if let Some(resp) = static_files::try_serve(ctx, &cfg.static_files).await {
        return Ok(resp);
    }

    // 2. Routing
    let Some(endpoint) = match_route(cfg, ctx.path) else {
        return Ok(http::build_404_response());
    };

    // 3. Authorization
    if !auth::authorize(ctx.path, ctx.credential.as_deref(), &cfg.auth) {
        return Ok(auth::deny_response(ctx.path, &cfg.auth));
    }

    // 4. Endpoint dispatch
    match endpoint {
        Endpoint::Health => Ok(health::respond(&state.health)),
        Endpoint::ErrorPage => {
            let html = pages::render_error_page(&cfg.pages).await;
            Ok(http::response::build_html_response(html, ctx.is_head))
        }
        Endpoint::Page(template) => {
            let html = pages::render(&cfg.pages, template).await?;
            Ok(http::response::build_html_response(html, ctx.is_head))
        }
    }
}

/// Match a request path against the declarative route table
#[must_use]
pub fn match_route<'a>(cfg: &'a Config, path: &str) -> Option<Endpoint<'a>> {
    if cfg.health.enabled && path == cfg.health.path {
        return Some(Endpoint::Health);
    }
    if path == cfg.pages.error_path {
        return Some(Endpoint::ErrorPage);
    }
    pages::route_template(&cfg.pages, path).map(Endpoint::Page)
}

/// Convert an escaped dispatch fault into the client-visible response
pub fn fault_response(fault: &DispatchError, cfg: &Config) -> Response<Full<Bytes>> {
    logger::log_error(&format!("Unhandled fault during dispatch: {fault}"));
    if cfg.runtime.mode.is_development() {
        http::build_diagnostic_response(fault)
    } else {
        http::build_redirect_response(&cfg.pages.error_path)
    }
}

/// Check HTTP method and return an early response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_value(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AuthConfig, HealthConfig, HttpConfig, LoggingConfig, PagesConfig, PerformanceConfig,
        RuntimeConfig, RuntimeMode, ServerConfig, StaticConfig,
    };
    use crate::pages::RenderError;

    fn test_config(static_root: &str, template_dir: &str) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            runtime: RuntimeConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            http: HttpConfig {
                server_name: "Pagehost/1.0".to_string(),
                enable_cors: false,
                max_body_size: 1024,
            },
            static_files: StaticConfig {
                root: static_root.to_string(),
                index_files: vec!["index.html".to_string()],
            },
            pages: PagesConfig {
                template_dir: template_dir.to_string(),
                ..PagesConfig::default()
            },
            auth: AuthConfig::default(),
            health: HealthConfig::default(),
        }
    }

    fn test_state(config: Config) -> Arc<AppState> {
        Arc::new(AppState::new(config))
    }

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            is_head: false,
            if_none_match: None,
            credential: None,
        }
    }

    #[test]
    fn routing_table() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config("no-static", dir.path().to_str().unwrap());

        assert_eq!(match_route(&cfg, "/healthz"), Some(Endpoint::Health));
        assert_eq!(match_route(&cfg, "/Error"), Some(Endpoint::ErrorPage));
        assert_eq!(match_route(&cfg, "/"), Some(Endpoint::Page("index.html")));
        assert_eq!(match_route(&cfg, "/unknown"), None);
    }

    #[test]
    fn disabled_health_is_not_routed() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config("no-static", dir.path().to_str().unwrap());
        cfg.health.enabled = false;
        assert_eq!(match_route(&cfg, "/healthz"), None);
    }

    #[tokio::test]
    async fn health_endpoint_answers_while_serving() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config("no-static", dir.path().to_str().unwrap()));

        let resp = dispatch(&ctx("/healthz"), &state).await.unwrap();
        assert_eq!(resp.status(), 200);

        state.health.begin_shutdown();
        let resp = dispatch(&ctx("/healthz"), &state).await.unwrap();
        assert_eq!(resp.status(), 503);
    }

    #[tokio::test]
    async fn unrouted_path_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config("no-static", dir.path().to_str().unwrap()));
        let resp = dispatch(&ctx("/does-not-exist"), &state).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn routed_page_renders_template() {
        let templates = tempfile::tempdir().unwrap();
        std::fs::write(templates.path().join("index.html"), "<h1>home</h1>").unwrap();

        let state = test_state(test_config("no-static", templates.path().to_str().unwrap()));
        let resp = dispatch(&ctx("/"), &state).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn static_file_served_before_routing() {
        let statics = tempfile::tempdir().unwrap();
        std::fs::write(statics.path().join("app.css"), "body{color:red}").unwrap();
        let templates = tempfile::tempdir().unwrap();

        let state = test_state(test_config(
            statics.path().to_str().unwrap(),
            templates.path().to_str().unwrap(),
        ));

        let resp = dispatch(&ctx("/app.css"), &state).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "text/css");
        assert_eq!(
            resp.headers().get("Content-Length").unwrap(),
            &"body{color:red}".len().to_string()
        );
    }

    #[tokio::test]
    async fn static_conditional_request_gets_304() {
        let statics = tempfile::tempdir().unwrap();
        std::fs::write(statics.path().join("app.js"), "console.log(1)").unwrap();
        let templates = tempfile::tempdir().unwrap();

        let state = test_state(test_config(
            statics.path().to_str().unwrap(),
            templates.path().to_str().unwrap(),
        ));

        let first = dispatch(&ctx("/app.js"), &state).await.unwrap();
        let etag = first.headers().get("ETag").unwrap().to_str().unwrap();

        let second = dispatch(
            &RequestContext {
                path: "/app.js",
                is_head: false,
                if_none_match: Some(etag.to_string()),
                credential: None,
            },
            &state,
        )
        .await
        .unwrap();
        assert_eq!(second.status(), 304);
    }

    #[tokio::test]
    async fn protected_page_denied_without_credential() {
        let templates = tempfile::tempdir().unwrap();
        std::fs::write(templates.path().join("admin.html"), "<h1>admin</h1>").unwrap();

        let mut cfg = test_config("no-static", templates.path().to_str().unwrap());
        cfg.pages
            .routes
            .insert("/admin".to_string(), "admin.html".to_string());
        cfg.auth.protected_prefixes = vec!["/admin".to_string()];
        let state = test_state(cfg);

        let resp = dispatch(&ctx("/admin"), &state).await.unwrap();
        assert_eq!(resp.status(), 403);

        let resp = dispatch(
            &RequestContext {
                path: "/admin",
                is_head: false,
                if_none_match: None,
                credential: Some("Bearer token".to_string()),
            },
            &state,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn missing_template_is_a_dispatch_fault() {
        let templates = tempfile::tempdir().unwrap();
        let state = test_state(test_config("no-static", templates.path().to_str().unwrap()));

        let fault = dispatch(&ctx("/"), &state).await.unwrap_err();
        assert!(matches!(
            fault,
            DispatchError::Render(RenderError::TemplateRead { .. })
        ));
    }

    #[tokio::test]
    async fn production_fault_redirects_to_error_page() {
        let templates = tempfile::tempdir().unwrap();
        let cfg = test_config("no-static", templates.path().to_str().unwrap());
        let state = test_state(cfg);

        let fault = dispatch(&ctx("/"), &state).await.unwrap_err();
        let resp = fault_response(&fault, &state.config);
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get("Location").unwrap(), "/Error");
    }

    #[tokio::test]
    async fn development_fault_surfaces_diagnostics() {
        let templates = tempfile::tempdir().unwrap();
        let mut cfg = test_config("no-static", templates.path().to_str().unwrap());
        cfg.runtime.mode = RuntimeMode::Development;
        let state = test_state(cfg);

        let fault = dispatch(&ctx("/"), &state).await.unwrap_err();
        let resp = fault_response(&fault, &state.config);
        assert_eq!(resp.status(), 500);
    }

    #[tokio::test]
    async fn error_page_route_always_renders() {
        // No error template on disk: the built-in fallback must answer 200
        let templates = tempfile::tempdir().unwrap();
        let state = test_state(test_config("no-static", templates.path().to_str().unwrap()));

        let resp = dispatch(&ctx("/Error"), &state).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn concurrent_dispatch_is_isolated() {
        let statics = tempfile::tempdir().unwrap();
        std::fs::write(statics.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(statics.path().join("b.txt"), "bravo!").unwrap();
        let templates = tempfile::tempdir().unwrap();

        let state = test_state(test_config(
            statics.path().to_str().unwrap(),
            templates.path().to_str().unwrap(),
        ));

        let mut tasks = Vec::new();
        for i in 0..32 {
            let state = Arc::clone(&state);
            tasks.push(tokio::spawn(async move {
                let path = if i % 2 == 0 { "/a.txt" } else { "/b.txt" };
                let resp = dispatch(
                    &RequestContext {
                        path,
                        is_head: false,
                        if_none_match: None,
                        credential: None,
                    },
                    &state,
                )
                .await
                .unwrap();
                let expected = if i % 2 == 0 { "5" } else { "6" };
                assert_eq!(resp.status(), 200);
                assert_eq!(
                    resp.headers().get("Content-Length").unwrap().to_str().unwrap(),
                    expected
                );
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }
}
