use pac_client::PacConfig;
use shared::models::Environment;
use std::path::PathBuf;

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | FISCAL_ENVIRONMENT | test | `test` or `production`; selects the CSD set |
/// | PAC_BASE_URL | http://localhost:8090 | PAC endpoint |
/// | PAC_TOKEN | (none) | PAC bearer token |
/// | PAC_TIMEOUT_SECS | 30 | PAC request timeout, clamped to 1-120 |
/// | CSD_DIR | ./csd | Root of `<RFC>/<environment>/` CSD directories |
/// | LOG_LEVEL | info | Log level |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (none) | Daily rolling log directory |
///
/// # Example
///
/// ```ignore
/// FISCAL_ENVIRONMENT=production PAC_BASE_URL=https://pac.example.com cargo run -- stamp invoice.json
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    /// Fiscal environment the CSDs and PAC belong to
    pub environment: Environment,
    pub pac_base_url: String,
    pub pac_token: Option<String>,
    pub pac_timeout_secs: u64,
    /// Root directory of the file credentials provider
    pub csd_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            environment: std::env::var("FISCAL_ENVIRONMENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            pac_base_url: std::env::var("PAC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8090".into()),
            pac_token: std::env::var("PAC_TOKEN").ok().filter(|t| !t.is_empty()),
            pac_timeout_secs: std::env::var("PAC_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            csd_dir: std::env::var("CSD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./csd")),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// PAC client configuration derived from this config
    pub fn pac_config(&self) -> PacConfig {
        let config = PacConfig::new(self.pac_base_url.clone()).with_timeout(self.pac_timeout_secs);
        match &self.pac_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("environment", &self.environment)
            .field("pac_base_url", &self.pac_base_url)
            .field("pac_token", &self.pac_token.as_ref().map(|_| "<redacted>"))
            .field("pac_timeout_secs", &self.pac_timeout_secs)
            .field("csd_dir", &self.csd_dir)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
