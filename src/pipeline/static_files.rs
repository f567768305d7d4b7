//! Static file middleware
//!
//! Tries to resolve every request path against the static assets root before
//! routing runs. Serves exact file bytes with an inferred content type, with
//! ETag-based conditional responses.

use std::path::{Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::config::StaticConfig;
use crate::http::{self, cache, mime, response};
use crate::logger;
use crate::pipeline::router::RequestContext;

/// Attempt to serve the request from the static root.
///
/// Returns `None` when no file matches so the pipeline continues to routing.
pub async fn try_serve(
    ctx: &RequestContext<'_>,
    cfg: &StaticConfig,
) -> Option<Response<Full<Bytes>>> {
    let file_path = resolve(&cfg.root, ctx.path, &cfg.index_files)?;

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read static file '{}': {e}",
                file_path.display()
            ));
            return Some(http::build_404_response());
        }
    };

    let content_type = mime::content_type_for(file_path.extension().and_then(|e| e.to_str()));
    let etag = cache::generate_etag(&content);

    if cache::etag_matches(ctx.if_none_match.as_deref(), &etag) {
        return Some(http::build_304_response(&etag));
    }

    Some(response::build_cached_response(
        Bytes::from(content),
        content_type,
        &etag,
        ctx.is_head,
    ))
}

/// Resolve a request path to a file under the static root.
///
/// Rejects parent-directory segments outright, falls back to index files for
/// directory paths, and confirms the canonical result stays inside the root.
#[must_use]
pub fn resolve(root: &str, path: &str, index_files: &[String]) -> Option<PathBuf> {
    let relative = path.trim_start_matches('/');
    if relative.split('/').any(|segment| segment == "..") {
        logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        return None;
    }

    // Missing static root simply means nothing to serve
    let root_canonical = Path::new(root).canonicalize().ok()?;

    let mut file_path = Path::new(root).join(relative);

    // Directory requests fall back to the first existing index file
    if file_path.is_dir() || relative.is_empty() || relative.ends_with('/') {
        for index in index_files {
            let candidate = file_path.join(index);
            if candidate.is_file() {
                file_path = candidate;
                break;
            }
        }
    }

    let canonical = file_path.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path escaped static root: {} -> {}",
            path,
            canonical.display()
        ));
        return None;
    }
    if !canonical.is_file() {
        return None;
    }

    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_files() -> Vec<String> {
        vec!["index.html".to_string()]
    }

    #[test]
    fn resolves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body{}").unwrap();

        let root = dir.path().to_str().unwrap();
        let resolved = resolve(root, "/style.css", &index_files()).unwrap();
        assert!(resolved.ends_with("style.css"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        assert!(resolve(root, "/nope.css", &index_files()).is_none());
    }

    #[test]
    fn directory_falls_back_to_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<html></html>").unwrap();

        let root = dir.path().to_str().unwrap();
        let resolved = resolve(root, "/docs/", &index_files()).unwrap();
        assert!(resolved.ends_with("docs/index.html"));
    }

    #[test]
    fn parent_segments_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        assert!(resolve(root, "/../etc/passwd", &index_files()).is_none());
        assert!(resolve(root, "/a/../../b", &index_files()).is_none());
    }

    #[test]
    fn missing_root_is_none() {
        assert!(resolve("no-such-root-dir", "/style.css", &index_files()).is_none());
    }
}
