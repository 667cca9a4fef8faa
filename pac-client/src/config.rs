//! PAC client configuration

use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Allowed timeout range in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 120;

/// Connection settings for a PAC
#[derive(Clone)]
pub struct PacConfig {
    /// PAC base URL (e.g., "https://pac.example.com")
    pub base_url: String,

    /// Bearer token for the PAC account
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl PacConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout, clamped to 1..=120 seconds
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
    }
}

impl Default for PacConfig {
    fn default() -> Self {
        Self::new("http://localhost:8090")
    }
}

impl std::fmt::Debug for PacConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_clamped() {
        assert_eq!(PacConfig::default().timeout, 30);
        assert_eq!(PacConfig::default().with_timeout(0).timeout, 1);
        assert_eq!(PacConfig::default().with_timeout(600).timeout, 120);
        assert_eq!(PacConfig::default().with_timeout(45).timeout_duration(), Duration::from_secs(45));
    }

    #[test]
    fn test_debug_hides_token() {
        let config = PacConfig::new("https://pac.test").with_token("secret-token");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("https://pac.test"));
    }
}
