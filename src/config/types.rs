// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub static_files: StaticConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Runtime mode configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub mode: RuntimeMode,
}

/// Development vs. production switch.
///
/// Controls whether dispatch faults surface as diagnostic responses
/// (development) or as a redirect to the error page (production).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

impl RuntimeMode {
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of the `Server` header stamped on every response
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Static file serving configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StaticConfig {
    /// Directory served at the site root
    #[serde(default = "default_static_root")]
    pub root: String,
    /// Index files tried when a directory path is requested
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
}

fn default_static_root() -> String {
    "static".to_string()
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: default_static_root(),
            index_files: default_index_files(),
        }
    }
}

/// Page routing and rendering configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PagesConfig {
    /// Directory containing page templates
    #[serde(default = "default_template_dir")]
    pub template_dir: String,
    /// Declarative route table: request path -> template file name
    #[serde(default = "default_routes")]
    pub routes: BTreeMap<String, String>,
    /// Path the fault wrapper redirects to in production mode
    #[serde(default = "default_error_path")]
    pub error_path: String,
    /// Template rendered at the error path; a built-in page is used when the
    /// file is absent
    #[serde(default = "default_error_template")]
    pub error_template: String,
    /// Site-wide variables substituted into templates as {{name}}
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

fn default_template_dir() -> String {
    "templates".to_string()
}

fn default_routes() -> BTreeMap<String, String> {
    BTreeMap::from([("/".to_string(), "index.html".to_string())])
}

fn default_error_path() -> String {
    "/Error".to_string()
}

fn default_error_template() -> String {
    "error.html".to_string()
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            routes: default_routes(),
            error_path: default_error_path(),
            error_template: default_error_template(),
            vars: BTreeMap::new(),
        }
    }
}

/// Authorization configuration
///
/// A request whose path matches one of `protected_prefixes` must carry the
/// configured header (and token, when one is set) to reach a page handler.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub protected_prefixes: Vec<String>,
    /// Header carrying the credential
    #[serde(default = "default_auth_header")]
    pub header: String,
    /// Expected header value; any non-empty value is accepted when unset
    #[serde(default)]
    pub token: Option<String>,
    /// Where unauthorized requests are redirected; 403 when unset
    #[serde(default)]
    pub login_path: Option<String>,
}

fn default_auth_header() -> String {
    "authorization".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: Vec::new(),
            header: default_auth_header(),
            token: None,
            login_path: None,
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    /// Enable the health check endpoint
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path
    #[serde(default = "default_health_path")]
    pub path: String,
}

fn default_health_enabled() -> bool {
    true
}

fn default_health_path() -> String {
    "/healthz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            path: default_health_path(),
        }
    }
}
