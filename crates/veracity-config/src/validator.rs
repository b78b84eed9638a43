//! Configuration validation.

use url::Url;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validate a loaded configuration. Run before wiring surfaces so a bad
/// endpoint fails at startup instead of on the first verification.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let base = config.api.base.trim();
    if base.is_empty() {
        return Err(ConfigError::Invalid("api.base must not be empty".to_string()));
    }
    let url = Url::parse(base)
        .map_err(|e| ConfigError::Invalid(format!("api.base is not a valid URL: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid(format!(
            "api.base must use http or https, got {}",
            url.scheme()
        )));
    }

    if config.store.max_reports == 0 {
        return Err(ConfigError::Invalid("store.max_reports must be at least 1".to_string()));
    }
    if config.relay.ack_timeout_ms == 0 {
        return Err(ConfigError::Invalid("relay.ack_timeout_ms must be at least 1".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_api_base_rejected() {
        let mut config = Config::default();
        config.api.base = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_non_url_api_base_rejected() {
        let mut config = Config::default();
        config.api.base = "not a url".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut config = Config::default();
        config.api.base = "ftp://files.example.com".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_https_accepted() {
        let mut config = Config::default();
        config.api.base = "https://check.example.com".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_report_bound_rejected() {
        let mut config = Config::default();
        config.store.max_reports = 0;
        assert!(validate(&config).is_err());
    }
}
