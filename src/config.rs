//! Runtime configuration resolved from the environment.

use crate::error::{CulinaryError, Result};
use crate::photo::providers::DEFAULT_BASE_URL;
use std::time::Duration;

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// Overrides the Gemini model identifier.
pub const MODEL_ENV_VAR: &str = "CULINARY_MODEL";

/// Overrides the API base URL.
pub const BASE_URL_ENV_VAR: &str = "CULINARY_BASE_URL";

/// Default Gemini image model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Reads the API key from the first non-empty variable in [`API_KEY_ENV_VARS`].
pub fn api_key_from_env() -> Result<String> {
    api_key_from(|name| std::env::var(name).ok())
}

fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(|| CulinaryError::MissingCredential(API_KEY_ENV_VARS.join(" or ")))
}

/// Settings needed to reach the hosted model.
#[derive(Clone)]
pub struct Config {
    /// API credential. Required.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// API base URL.
    pub base_url: String,
    /// Optional HTTP timeout. The adapter itself never times out.
    pub timeout: Option<Duration>,
}

impl Config {
    /// Resolves configuration from the process environment.
    ///
    /// A missing credential is a startup error: callers should abort.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = api_key_from(&lookup)?;
        let model = lookup(MODEL_ENV_VAR)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup(BASE_URL_ENV_VAR)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            model,
            base_url,
            timeout: None,
        })
    }

    /// Overrides the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets an HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_credential() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, CulinaryError::MissingCredential(ref vars) if vars == "GOOGLE_API_KEY or API_KEY"));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let err = Config::from_lookup(lookup(&[("GOOGLE_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, CulinaryError::MissingCredential(_)));
    }

    #[test]
    fn test_api_key_fallback_order() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "fallback")])).unwrap();
        assert_eq!(config.api_key, "fallback");

        let config = Config::from_lookup(lookup(&[
            ("API_KEY", "fallback"),
            ("GOOGLE_API_KEY", "primary"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "primary");
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_API_KEY", "k")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.timeout.is_none());

        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "k"),
            (MODEL_ENV_VAR, "gemini-3-pro-image-preview"),
            (BASE_URL_ENV_VAR, "http://127.0.0.1:8080"),
        ]))
        .unwrap()
        .with_timeout(Duration::from_secs(90));
        assert_eq!(config.model, "gemini-3-pro-image-preview");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_API_KEY", "AIza-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("AIza-secret"));
    }
}
