//! Client configuration.
//!
//! `ClientConfig` is plain data: a host can build it in code, deserialize it
//! from its own config file, or read it from the environment with
//! [`ClientConfig::from_env`].

use serde::Deserialize;

use crate::context::is_path_segment;
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";
pub const DEFAULT_ENVIRONMENT: &str = "master";

pub const ENV_TOKEN: &str = "CONTENTFUL_MANAGEMENT_TOKEN";
pub const ENV_BASE_URL: &str = "CONTENTFUL_BASE_URL";
pub const ENV_ENVIRONMENT: &str = "CONTENTFUL_ENVIRONMENT";
pub const ENV_LOCALE: &str = "CONTENTFUL_LOCALE";

/// How entry paths are scoped for delete and unpublish.
///
/// The management API historically accepted `DELETE /spaces/{S}/entries/{ID}`
/// and `DELETE /spaces/{S}/entries/{ID}/published` without an environment
/// segment; those resolve against the space's default environment.
/// `Legacy` keeps that wire shape. `EnvironmentScoped` routes every
/// operation through `/environments/{E}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathScheme {
    #[default]
    Legacy,
    EnvironmentScoped,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub access_token: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub path_scheme: PathScheme,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            access_token: access_token.into(),
            environment: default_environment(),
            locale: None,
            path_scheme: PathScheme::default(),
            user_agent: None,
        }
    }

    /// Build a config from `CONTENTFUL_*` environment variables.
    ///
    /// `CONTENTFUL_MANAGEMENT_TOKEN` is required; the others fall back to
    /// the defaults used by [`ClientConfig::new`].
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = non_empty(ENV_TOKEN)
            .ok_or_else(|| ApiError::Config(format!("{ENV_TOKEN} is not set")))?;
        let mut config = Self::new(token);
        if let Some(url) = non_empty(ENV_BASE_URL) {
            config = config.with_base_url(&url);
        }
        if let Some(env) = non_empty(ENV_ENVIRONMENT) {
            config = config.with_environment(env);
        }
        if let Some(locale) = non_empty(ENV_LOCALE) {
            config = config.with_locale(locale);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_path_scheme(mut self, scheme: PathScheme) -> Self {
        self.path_scheme = scheme;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Reject configs that cannot produce a usable request.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.access_token.trim().is_empty() {
            return Err(ApiError::Config("access token is empty".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "base url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if !is_path_segment(&self.environment) {
            return Err(ApiError::Config(format!(
                "invalid environment {:?}",
                self.environment
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn new_uses_defaults() {
        let config = ClientConfig::new("token");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.environment, "master");
        assert_eq!(config.path_scheme, PathScheme::Legacy);
        assert!(config.locale.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_env_requires_token() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));

        let err = ClientConfig::from_lookup(lookup(&[(ENV_TOKEN, "  ")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn from_env_reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_TOKEN, "secret"),
            (ENV_BASE_URL, "http://localhost:3000/"),
            (ENV_ENVIRONMENT, "staging"),
            (ENV_LOCALE, "en-US"),
        ]))
        .unwrap();
        assert_eq!(config.access_token, "secret");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.locale.as_deref(), Some("en-US"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"access_token":"t","path_scheme":"environment_scoped"}"#)
                .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.environment, "master");
        assert_eq!(config.path_scheme, PathScheme::EnvironmentScoped);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("t").with_base_url("ftp://x").validate().is_err());
        for env in ["", "a/b", "a b", "a?b", "é", "100%"] {
            assert!(
                matches!(
                    ClientConfig::new("t").with_environment(env).validate(),
                    Err(ApiError::Config(_))
                ),
                "{env:?} accepted"
            );
        }
        assert!(ClientConfig::new("t").with_environment("staging-2").validate().is_ok());
    }
}
