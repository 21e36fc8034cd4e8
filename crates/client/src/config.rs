//! Client configuration.
//!
//! The CLI reads these from flags or the environment (`.env` included):
//!
//! - `SHOPFRONT_API_BASE_URL` - Backend base URL including any path prefix
//!   (default: `https://backend-for-ecommerce-1.onrender.com/api`)
//! - `SHOPFRONT_DATA_DIR` - Directory holding the persisted session and cart
//!   (default: `<platform data dir>/shopfront`, or `./.shopfront` when the
//!   platform has none)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Backend used when no base URL is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://backend-for-ecommerce-1.onrender.com/api";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Shopfront client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub api_base_url: Url,
    /// Directory for durable local state.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Build a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the base URL is not an
    /// absolute http(s) URL.
    pub fn new(api_base_url: &str, data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            data_dir: data_dir.into(),
        })
    }
}

/// Platform data directory for shopfront state.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".shopfront"), |dir| dir.join("shopfront"))
}

/// Parse and validate the backend base URL.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: value.to_string(),
        reason,
    };
    let url = Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme '{}', expected http or https",
            url.scheme()
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(
            "base URL cannot carry a query string or fragment".to_string(),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_keeps_path_prefix() {
        let url = parse_base_url("https://shop.example.com/api").unwrap();
        assert_eq!(url.path(), "/api");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let err = parse_base_url("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { ref url, .. } if url == "not a url"));
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("ftp://shop.example.com/api").is_err());
    }

    #[test]
    fn test_parse_base_url_rejects_query() {
        assert!(parse_base_url("https://shop.example.com/api?x=1").is_err());
    }

    #[test]
    fn test_default_base_url_is_valid() {
        assert!(parse_base_url(DEFAULT_API_BASE_URL).is_ok());
    }

    #[test]
    fn test_new() {
        let config = ClientConfig::new("http://127.0.0.1:4000/api", "/tmp/shopfront").unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:4000/api");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shopfront"));
    }

    #[test]
    fn test_default_data_dir_ends_with_app_name() {
        let dir = default_data_dir();
        assert!(dir.ends_with("shopfront") || dir.ends_with(".shopfront"));
    }
}
