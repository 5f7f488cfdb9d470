//! Sync configuration
//!
//! Loaded from `CRM_`-prefixed environment variables, with `__` separating
//! nested sections:
//!
//! * `CRM_TERRITORY` - Territory written on every created or updated record (required)
//! * `CRM_PAGE_SIZE` - Records per page for list and search calls, 1 to 200 (default: 200)
//! * `CRM_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `CRM_CONNECTION__CLIENT_ID` / `CRM_CONNECTION__CLIENT_SECRET` - OAuth client (required)
//! * `CRM_CONNECTION__ACCOUNTS_URL`, `CRM_CONNECTION__API_BASE_URL`,
//!   `CRM_CONNECTION__REDIRECT_URI`, `CRM_CONNECTION__CURRENT_USER_EMAIL`
//! * `CRM_CONNECTION__SANDBOX` - Use the sandbox environment (default: false)
//! * `CRM_CONNECTION__TOKEN_PERSISTENCE_PATH` - Directory for the token store (default: .)

use serde::Deserialize;
use thiserror::Error;

/// Largest page the CRM serves in one call
pub const MAX_PAGE_SIZE: u32 = 200;

const ENV_PREFIX: &str = "CRM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Connection settings handed to the CRM adapter's initialisation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrmConnectionConfig {
    pub accounts_url: String,
    pub api_base_url: String,
    pub api_version: String,
    pub client_id: String,
    pub client_secret: String,
    pub current_user_email: String,
    pub redirect_uri: String,
    pub sandbox: bool,
    pub token_persistence_path: String,
    pub access_type: String,
}

impl Default for CrmConnectionConfig {
    fn default() -> Self {
        Self {
            accounts_url: String::new(),
            api_base_url: String::new(),
            api_version: "v2".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            current_user_email: String::new(),
            redirect_uri: String::new(),
            sandbox: false,
            token_persistence_path: ".".to_string(),
            access_type: "offline".to_string(),
        }
    }
}

/// Full sync configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub connection: CrmConnectionConfig,
    pub territory: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The part of the configuration a sync service needs per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub territory: String,
    pub page_size: u32,
}

impl SyncSettings {
    pub fn new(territory: impl Into<String>) -> Self {
        Self {
            territory: territory.into(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl SyncConfig {
    /// Loads configuration from the environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load(Self::environment())
    }

    /// Loads configuration from an explicit set of `CRM_*` variables
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = config::Map::new();
        for (key, value) in vars {
            source.insert(key.into(), value.into());
        }
        Self::load(Self::environment().source(Some(source)))
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    fn load(environment: config::Environment) -> Result<Self, ConfigError> {
        let config: SyncConfig = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: format!("{} is outside 1..={}", self.page_size, MAX_PAGE_SIZE),
            });
        }
        if self.territory.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "territory",
                reason: "must not be empty".to_string(),
            });
        }
        if self.connection.client_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "connection.client_id",
                reason: "must not be empty".to_string(),
            });
        }
        if self.connection.client_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "connection.client_secret",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            territory: self.territory.clone(),
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CRM_TERRITORY", "EMEA"),
            ("CRM_CONNECTION__CLIENT_ID", "1000.ABC"),
            ("CRM_CONNECTION__CLIENT_SECRET", "s3cret"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = SyncConfig::from_vars(base_vars()).unwrap();

        assert_eq!(config.page_size, 200);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.connection.api_version, "v2");
        assert_eq!(config.connection.access_type, "offline");
        assert!(!config.connection.sandbox);
        assert_eq!(config.settings(), SyncSettings::new("EMEA"));
    }

    #[test]
    fn test_page_size_out_of_range() {
        let mut vars = base_vars();
        vars.push(("CRM_PAGE_SIZE", "500"));

        let err = SyncConfig::from_vars(vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "page_size", .. }));
    }

    #[test]
    fn test_missing_territory_fails() {
        let vars = base_vars().into_iter().filter(|(k, _)| *k != "CRM_TERRITORY");
        assert!(SyncConfig::from_vars(vars).is_err());
    }
}
