//! Connection configuration

use serde::Deserialize;

use crate::error::{AxlError, Result};

/// Settings for connecting to one AXL endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AxlConfig {
    /// Full AXL endpoint, e.g. `https://cucm.example.com:8443/axl/`
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// AXL schema version; selects the namespace and `SOAPAction`
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Connect and request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Publishers commonly run on self-signed certificates
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

fn default_schema_version() -> String {
    "12.5".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl AxlConfig {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            schema_version: default_schema_version(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }

    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = version.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Load from `AXL_URL`, `AXL_USERNAME`, `AXL_PASSWORD`,
    /// `AXL_SCHEMA_VERSION`, `AXL_TIMEOUT_SECS` and `AXL_ACCEPT_INVALID_CERTS`
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("AXL"))
    }

    /// Load from any `config` source
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: AxlConfig = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never produce a working connection
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(AxlError::config("url must not be empty"));
        }
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(AxlError::config(format!("url {} is not an http(s) url", self.url)));
        }
        if self.username.trim().is_empty() {
            return Err(AxlError::config("username must not be empty"));
        }
        if self.schema_version.trim().is_empty() {
            return Err(AxlError::config("schema_version must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(AxlError::config("timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("AXL").source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = AxlConfig::new("https://cucm:8443/axl/", "admin", "secret");
        assert_eq!(config.schema_version, "12.5");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.accept_invalid_certs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_environment_source() {
        let config = AxlConfig::from_source(env(&[
            ("AXL_URL", "https://10.0.0.1:8443/axl/"),
            ("AXL_USERNAME", "axladmin"),
            ("AXL_PASSWORD", "pw"),
            ("AXL_SCHEMA_VERSION", "14.0"),
            ("AXL_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.url, "https://10.0.0.1:8443/axl/");
        assert_eq!(config.username, "axladmin");
        assert_eq!(config.schema_version, "14.0");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let result = AxlConfig::from_source(env(&[("AXL_USERNAME", "axladmin")]));
        assert!(matches!(result, Err(AxlError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(AxlConfig::new("", "u", "p").validate().is_err());
        assert!(AxlConfig::new("ftp://cucm", "u", "p").validate().is_err());
        assert!(AxlConfig::new("https://cucm", "", "p").validate().is_err());
        assert!(AxlConfig::new("https://cucm", "u", "p")
            .with_timeout_secs(0)
            .validate()
            .is_err());
    }
}
