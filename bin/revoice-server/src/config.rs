//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for revoice-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// Root directory for per-task working directories
    /// (default: `<system temp>/revoice`).
    pub work_dir: String,

    /// External converter executable invoked for each task (default: `"rvc"`).
    pub converter_cmd: String,

    /// Seconds between expiry sweep passes (default: 3600).
    pub sweep_interval_secs: u64,

    /// Hours a task record is retained before the sweeper may remove it
    /// (default: 24).
    pub retention_hours: i64,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins; wildcard when unset.
    pub cors_allowed_origins: Option<String>,

    /// Serve the Swagger UI (default: `true`; disable in production).
    pub enable_swagger: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("REVOICE_BIND", "0.0.0.0:8000"),
            work_dir: std::env::var("REVOICE_WORK_DIR").unwrap_or_else(|_| {
                std::env::temp_dir()
                    .join("revoice")
                    .to_string_lossy()
                    .into_owned()
            }),
            converter_cmd: env_or("REVOICE_CONVERTER", "rvc"),
            sweep_interval_secs: parse_env("REVOICE_SWEEP_INTERVAL_SECS", 3600),
            retention_hours: parse_env("REVOICE_RETENTION_HOURS", 24),
            log_level: env_or("REVOICE_LOG", "info"),
            log_json: std::env::var("REVOICE_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_allowed_origins: std::env::var("REVOICE_CORS_ORIGINS").ok(),
            enable_swagger: std::env::var("REVOICE_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
