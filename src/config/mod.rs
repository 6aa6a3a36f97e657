//! Configuration loading and management

use crate::core::auth::Role;
use crate::core::error::ConfigError;
use crate::core::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageSettings};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Page size defaults, with per-resource overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,

    /// Resource name -> default page size (e.g. `products: 12`)
    pub resources: HashMap<String, usize>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            resources: HashMap::from([("products".to_string(), 12)]),
        }
    }
}

impl PaginationConfig {
    /// Settings for one resource
    pub fn settings_for(&self, resource: &str) -> PageSettings {
        let default = self
            .resources
            .get(resource)
            .copied()
            .unwrap_or(self.default_page_size);
        PageSettings::new(default, self.max_page_size)
    }
}

/// Account created at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_superuser: bool,
}

/// Complete storefront configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StorefrontConfig {
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub users: Vec<SeedUser>,
}

impl StorefrontConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path, e),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in configuration used when no file is given
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pagination = &self.pagination;
        if pagination.max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.max_page_size".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if pagination.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_page_size".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some((resource, _)) = pagination.resources.iter().find(|(_, size)| **size == 0) {
            return Err(ConfigError::InvalidValue {
                field: format!("pagination.resources.{}", resource),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(user) = self.users.iter().find(|u| u.username.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "users.username".to_string(),
                value: user.username.clone(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn page_settings(&self, resource: &str) -> PageSettings {
        self.pagination.settings_for(resource)
    }
}
