//! Process configuration (§4.13), loaded once at startup from environment
//! variables. No dynamic reloading: the runtime reads `Config` at boot and
//! hands it to `EngineContext`/`tracing_subscriber` unchanged for the life
//! of the process.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Console,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub filepath: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub lms_base_path: String,
    pub trusted_issuers: Vec<String>,
    pub default_scope: String,
    pub scope_prefix: String,
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub max_concurrent_reconciles: usize,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub requeue_period: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub token: TokenConfig,
    pub log: LogConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub skip_tls_verify: bool,
    pub reconciler: ReconcilerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig { url: "https://localhost:8443".to_string() },
            token: TokenConfig { url: "https://localhost:8443/auth/token".to_string() },
            log: LogConfig { level: "info".to_string(), format: LogFormat::Console },
            database: DatabaseConfig { filepath: "rover-engine.db".to_string() },
            security: SecurityConfig {
                lms_base_path: "/lms".to_string(),
                trusted_issuers: vec![],
                default_scope: "api:read".to_string(),
                scope_prefix: "api".to_string(),
            },
            skip_tls_verify: false,
            reconciler: ReconcilerConfig {
                max_concurrent_reconciles: 4,
                backoff_base: Duration::from_millis(500),
                backoff_cap: Duration::from_secs(60),
                requeue_period: Duration::from_secs(120),
            },
        }
    }
}

impl Config {
    /// Loads configuration from `{PROGRAM}_*` environment variables, falling
    /// back to `Config::default()` for anything unset. `program` is the
    /// env-var prefix (e.g. `"ROVER"` for `ROVER_SERVER_URL`).
    pub fn from_env(program: &str) -> Self {
        let mut config = Self::default();
        let var = |suffix: &str| std::env::var(format!("{program}_{suffix}")).ok();

        if let Some(url) = var("SERVER_URL") {
            config.server.url = url;
        }
        if let Some(url) = var("TOKEN_URL") {
            config.token.url = url;
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.log.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.log.format = match format.as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Console,
            };
        }
        if let Some(flag) = std::env::var("SKIP_TLS_VERIFY").ok() {
            config.skip_tls_verify = matches!(flag.as_str(), "1" | "true" | "TRUE");
        }
        config
    }

    /// The bearer token a `{PROGRAM}_TOKEN` env var carries, if set. Not
    /// part of `Config` itself since it's a credential, not a setting --
    /// callers read it once at startup and keep it out of `Debug` output.
    pub fn token_from_env(program: &str) -> Option<String> {
        std::env::var(format!("{program}_TOKEN")).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.log.format, LogFormat::Console);
        assert!(!config.skip_tls_verify);
        assert_eq!(config.reconciler.max_concurrent_reconciles, 4);
    }

    #[test]
    fn from_env_overrides_defaults() {
        // SAFETY: tests run single-threaded within this module's env mutations.
        unsafe {
            std::env::set_var("ROVERTEST_SERVER_URL", "https://example.test");
            std::env::set_var("ROVERTEST_LOG_FORMAT", "json");
            std::env::set_var("SKIP_TLS_VERIFY", "true");
        }
        let config = Config::from_env("ROVERTEST");
        assert_eq!(config.server.url, "https://example.test");
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.skip_tls_verify);
        unsafe {
            std::env::remove_var("ROVERTEST_SERVER_URL");
            std::env::remove_var("ROVERTEST_LOG_FORMAT");
            std::env::remove_var("SKIP_TLS_VERIFY");
        }
    }

    #[test]
    fn token_from_env_reads_program_prefixed_var() {
        unsafe {
            std::env::set_var("ROVERTEST2_TOKEN", "prod--g--t.abc");
        }
        assert_eq!(Config::token_from_env("ROVERTEST2").as_deref(), Some("prod--g--t.abc"));
        unsafe {
            std::env::remove_var("ROVERTEST2_TOKEN");
        }
    }
}
