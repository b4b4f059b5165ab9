//! API Configuration Module
//!
//! Server settings (bind address, CORS) come from environment variables.
//! Prompt templates and generation settings come from a YAML file with a
//! few environment overrides, see [`load_knowpilot_config`].

use std::net::SocketAddr;
use std::path::Path;

use knowpilot_core::{ConfigError, KnowPilotConfig};

/// Default location of the YAML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://knowpilot.app,https://admin.knowpilot.app"
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `KNOWPILOT_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `KNOWPILOT_API_PORT`: Listen port (default: 8000)
    /// - `KNOWPILOT_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `KNOWPILOT_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `KNOWPILOT_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host = std::env::var("KNOWPILOT_API_BIND").unwrap_or(defaults.bind_host);

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("KNOWPILOT_API_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let cors_origins = std::env::var("KNOWPILOT_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("KNOWPILOT_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("KNOWPILOT_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        Self {
            bind_host,
            port,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
        }
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse().map_err(|e| ConfigError::InvalidValue {
            field: "bind address".to_string(),
            value: addr.clone(),
            reason: format!("{}", e),
        })
    }

    /// Check if running with an explicit origin list (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.knowpilot.app
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

// ============================================================================
// PROMPTS AND GENERATION SETTINGS
// ============================================================================

/// Load prompt templates and generation settings.
///
/// Reads the YAML file named by `KNOWPILOT_CONFIG` (default
/// [`DEFAULT_CONFIG_PATH`]). A missing file at the default path falls back
/// to built-in defaults; a missing file at an explicitly configured path is
/// an error. Afterwards these variables override the file:
/// - `KNOWPILOT_OLLAMA_URL`: generation endpoint
/// - `KNOWPILOT_MODEL`: model name
/// - `KNOWPILOT_GENERATION_TIMEOUT_SECS`: whole-call timeout
///
/// The result is validated before it is returned.
pub fn load_knowpilot_config() -> Result<KnowPilotConfig, ConfigError> {
    let (path, explicit) = match std::env::var("KNOWPILOT_CONFIG") {
        Ok(path) => (path, true),
        Err(_) => (DEFAULT_CONFIG_PATH.to_string(), false),
    };

    let mut config = if Path::new(&path).exists() {
        read_config_file(&path)?
    } else if explicit {
        return Err(ConfigError::LoadFailed {
            path,
            reason: "file does not exist".to_string(),
        });
    } else {
        tracing::info!(path = %path, "No configuration file found, using defaults");
        KnowPilotConfig::default()
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Parse a YAML configuration file. Sections left out keep their defaults.
pub fn read_config_file(path: &str) -> Result<KnowPilotConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    parse_config(&text).map_err(|reason| ConfigError::LoadFailed {
        path: path.to_string(),
        reason,
    })
}

fn parse_config(text: &str) -> Result<KnowPilotConfig, String> {
    if text.trim().is_empty() {
        return Ok(KnowPilotConfig::default());
    }
    serde_yaml::from_str(text).map_err(|e| e.to_string())
}

fn apply_env_overrides(config: &mut KnowPilotConfig) -> Result<(), ConfigError> {
    if let Ok(endpoint) = std::env::var("KNOWPILOT_OLLAMA_URL") {
        config.generation.endpoint = endpoint;
    }
    if let Ok(model) = std::env::var("KNOWPILOT_MODEL") {
        config.generation.model = model;
    }
    if let Ok(raw) = std::env::var("KNOWPILOT_GENERATION_TIMEOUT_SECS") {
        config.generation.timeout_secs =
            raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "KNOWPILOT_GENERATION_TIMEOUT_SECS".to_string(),
                value: raw.clone(),
                reason: "expected a whole number of seconds".to_string(),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn test_bind_addr_rejects_garbage_host() {
        let config = ApiConfig {
            bind_host: "not a host".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_origin_allowed_dev_mode() {
        let config = ApiConfig::default();
        assert!(!config.is_production());
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }

    #[test]
    fn test_origin_allowed_production() {
        let config = ApiConfig {
            cors_origins: vec![
                "https://knowpilot.app".to_string(),
                "*.knowpilot.app".to_string(),
            ],
            ..ApiConfig::default()
        };

        assert!(config.is_production());
        assert!(config.is_origin_allowed("https://knowpilot.app"));
        assert!(config.is_origin_allowed("https://admin.knowpilot.app"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(!config.is_origin_allowed("https://notknowpilot.app"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = parse_config(
            "generation:\n  model: mistral\nprompts:\n  qa_template: \"Q&A for {content}\"\n",
        )
        .unwrap();
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.generation.endpoint, "http://localhost:11434");
        assert_eq!(config.prompts.qa_template, "Q&A for {content}");
        assert_eq!(
            config.prompts.knowledge_template,
            KnowPilotConfig::default().prompts.knowledge_template
        );
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(parse_config("\n").unwrap(), KnowPilotConfig::default());
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        assert!(parse_config("generation: [unclosed").is_err());
    }

    #[test]
    fn test_bundled_config_file_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/config.yaml");
        let config = read_config_file(path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.generation.model, "llama3.2");
    }
}
