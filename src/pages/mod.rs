//! Page rendering module
//!
//! Maps declarative routes to template files and produces rendered HTML.
//! Templates are plain HTML with `{{name}}` placeholders substituted from the
//! configured site variables; there is no logic or data binding beyond that.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tokio::fs;

use crate::config::PagesConfig;

/// Built-in error page used when the configured error template is missing.
/// The error page must never fault itself.
const FALLBACK_ERROR_HTML: &str = r"<!DOCTYPE html>
<html>
<head><title>Error</title></head>
<body>
<h1>An error occurred</h1>
<p>An error occurred while processing your request.</p>
</body>
</html>";

/// Errors raised while rendering a page; these are the unhandled faults the
/// pipeline's outermost wrapper converts for the client.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template '{path}'")]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Look up the template for a request path (exact match on the route table)
#[must_use]
pub fn route_template<'a>(pages: &'a PagesConfig, path: &str) -> Option<&'a str> {
    pages.routes.get(path).map(String::as_str)
}

/// Render the template file, substituting site variables
pub async fn render(pages: &PagesConfig, template: &str) -> Result<String, RenderError> {
    let path = Path::new(&pages.template_dir).join(template);
    let raw = fs::read_to_string(&path)
        .await
        .map_err(|source| RenderError::TemplateRead {
            path: path.display().to_string(),
            source,
        })?;
    Ok(substitute(&raw, &pages.vars))
}

/// Render the error page, falling back to the built-in page when the
/// configured template cannot be read
pub async fn render_error_page(pages: &PagesConfig) -> String {
    match render(pages, &pages.error_template).await {
        Ok(html) => html,
        Err(_) => substitute(FALLBACK_ERROR_HTML, &pages.vars),
    }
}

/// Replace each `{{name}}` placeholder with its configured value
#[must_use]
pub fn substitute(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut result = template.to_string();
    for (name, value) in vars {
        result = result.replace(&format!("{{{{{name}}}}}"), value);
    }
    result
}
