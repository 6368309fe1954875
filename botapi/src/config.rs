//! Client configuration.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` and can be changed with `-f` or the `BOTAPI_CONFIG` environment
//! variable.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - base configuration (default: `config.yaml`, may be absent)
//! 2. **Environment variables** - variables prefixed with `BOTAPI_` override YAML values
//!
//! ```yaml
//! url: https://api.telegram.org
//! token: "123456:ABC-DEF"
//! verbose: false
//! timeout: 30s
//! ```
//!
//! ```bash
//! BOTAPI_TOKEN="123456:ABC-DEF"
//! BOTAPI_VERBOSE=true
//! BOTAPI_TIMEOUT=2m
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Where the API lives unless configured otherwise.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Simple CLI args - just for specifying the config file
#[derive(clap::Args, Debug, Clone)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "BOTAPI_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without calling the API.
    #[arg(long)]
    pub validate: bool,
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the API server. Requests go to `<url>/bot<token>/<method>`.
    pub url: Url,
    /// Bot token issued by the platform
    pub token: String,
    /// Log every request's parameters and the raw response
    pub verbose: bool,
    /// Timeout for a whole request, including streaming an upload
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            token: String::new(),
            verbose: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Config pointing at `url` with `token`, everything else default.
    pub fn new(url: Url, token: impl Into<String>) -> Self {
        Self {
            url,
            token: token.into(),
            ..Default::default()
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // BOTAPI_CONFIG names the file, it is not a setting
            .merge(Env::prefixed("BOTAPI_").ignore(&["CONFIG"]).split("__"))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::Config(
                "token is not configured. Set BOTAPI_TOKEN or add token to the config file.".to_string(),
            ));
        }

        if self.token.contains('/') {
            return Err(Error::Config("token must not contain '/'".to_string()));
        }

        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(Error::Config(format!("url must be http or https, got {}", self.url)));
        }

        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}
