//! Process configuration resolved from the environment.

use reqwest::{Client, Proxy};
use snafu::{OptionExt, ResultExt, Snafu};
use std::fmt;
use url::Url;

use crate::{
    client::{Error as ClientError, Gemini, Model, DEFAULT_BASE_URL},
    error::ErrorKind,
};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const PROXY_URL_VAR: &str = "GEMINI_PROXY_URL";
pub const DEBUG_VAR: &str = "GEMINI_DEBUG";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("GEMINI_API_KEY is not set"))]
    MissingApiKey,

    #[snafu(display("invalid base URL '{url}'"))]
    InvalidBaseUrl { source: url::ParseError, url: String },

    #[snafu(display("invalid proxy URL '{url}'"))]
    InvalidProxyUrl { source: url::ParseError, url: String },

    #[snafu(display("failed to configure proxy '{url}'"))]
    Proxy { source: reqwest::Error, url: Url },

    #[snafu(display("failed to create Gemini client"))]
    CreateClient { source: Box<ClientError> },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CreateClient { source } => source.kind(),
            _ => ErrorKind::Configuration,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: Model,
    pub base_url: Url,
    /// Explicit proxy; `HTTP_PROXY`/`HTTPS_PROXY` are honored by reqwest regardless
    pub proxy_url: Option<Url>,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = var(API_KEY_VAR).context(MissingApiKeySnafu)?;
        let model = var(MODEL_VAR).map(Model::from).unwrap_or_default();

        let base_url = var(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url).context(InvalidBaseUrlSnafu {
            url: base_url.as_str(),
        })?;

        let proxy_url = var(PROXY_URL_VAR)
            .map(|url| Url::parse(&url).context(InvalidProxyUrlSnafu { url: url.as_str() }))
            .transpose()?;

        Ok(Self {
            api_key,
            model,
            base_url,
            proxy_url,
            debug: var(DEBUG_VAR).is_some_and(|value| is_truthy(&value)),
        })
    }

    /// Replace the model when one is given.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model.into();
        }
        self
    }

    /// Build the API client, routing through the explicit proxy when one is set.
    pub fn client(&self) -> Result<Gemini, Error> {
        let mut builder = Client::builder();
        if let Some(url) = &self.proxy_url {
            let proxy = Proxy::all(url.clone()).context(ProxySnafu { url: url.clone() })?;
            builder = builder.proxy(proxy);
        }

        Gemini::with_client_builder(
            builder,
            &self.api_key,
            self.model.clone(),
            self.base_url.clone(),
        )
        .map_err(Box::new)
        .context(CreateClientSnafu)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("proxy_url", &self.proxy_url.as_ref().map(Url::as_str))
            .field("debug", &self.debug)
            .finish()
    }
}

pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn api_key_is_mandatory() {
        let error = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(error, Error::MissingApiKey));
        assert_eq!(error.kind(), ErrorKind::Configuration);

        let error = Config::from_lookup(lookup(&[(API_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(error, Error::MissingApiKey));
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = Config::from_lookup(lookup(&[(API_KEY_VAR, "secret")])).unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, Model::Gemini20Flash);
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert!(config.proxy_url.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn environment_overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, "gemini-2.5-pro"),
            (BASE_URL_VAR, "http://localhost:8080/v1beta/"),
            (PROXY_URL_VAR, "http://proxy.local:3128"),
            (DEBUG_VAR, "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.model, Model::Gemini25Pro);
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/v1beta/");
        assert_eq!(
            config.proxy_url.as_ref().map(Url::as_str),
            Some("http://proxy.local:3128/")
        );
        assert!(config.debug);
    }

    #[test]
    fn malformed_urls_are_configuration_errors() {
        let error = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (PROXY_URL_VAR, "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(error, Error::InvalidProxyUrl { .. }));
        assert_eq!(error.kind(), ErrorKind::Configuration);

        let error = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (BASE_URL_VAR, "::"),
        ]))
        .unwrap_err();
        assert!(matches!(error, Error::InvalidBaseUrl { .. }));
    }

    #[test]
    fn cli_model_wins_over_environment() {
        let config = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, "gemini-2.5-pro"),
        ]))
        .unwrap()
        .with_model(Some("gemini-2.5-flash".to_string()));
        assert_eq!(config.model, Model::Gemini25Flash);
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = Config::from_lookup(lookup(&[(API_KEY_VAR, "secret")])).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn client_builds_with_proxy() {
        let config = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (PROXY_URL_VAR, "http://127.0.0.1:3128"),
        ]))
        .unwrap();
        let client = config.client().unwrap();
        assert_eq!(client.model(), &Model::Gemini20Flash);
    }
}
