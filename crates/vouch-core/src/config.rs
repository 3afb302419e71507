//! Configuration for Vouch

use crate::{DEFAULT_PASSWORD_ATTRIBUTE, USERNAME_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Password encoder names accepted in `authenticator.password_encoder`
pub const KNOWN_PASSWORD_ENCODERS: &[&str] = &["plaintext", "sha", "md5"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VouchConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub authenticator: AuthenticatorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VouchConfig {
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Parse(e.to_string()))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `VOUCH_*` environment variables on this configuration
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("VOUCH_LDAP_URL") {
            self.directory.url = url;
        }
        if let Some(base) = lookup("VOUCH_BASE_DN") {
            self.directory.base_dn = base;
        }
        if let Some(dn) = lookup("VOUCH_MANAGER_DN") {
            self.directory.manager_dn = Some(dn);
        }
        if let Some(password) = lookup("VOUCH_MANAGER_PASSWORD") {
            self.directory.manager_password = Some(password);
        }
        if let Some(patterns) = lookup("VOUCH_USER_DN_PATTERNS") {
            self.authenticator.user_dn_patterns = patterns
                .split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(filter) = lookup("VOUCH_USER_SEARCH_FILTER") {
            self.authenticator
                .user_search
                .get_or_insert_with(UserSearchConfig::default)
                .filter = filter;
        }
        if let Some(base) = lookup("VOUCH_USER_SEARCH_BASE") {
            self.authenticator
                .user_search
                .get_or_insert_with(UserSearchConfig::default)
                .search_base = base;
        }
        if let Some(encoder) = lookup("VOUCH_PASSWORD_ENCODER") {
            self.authenticator.password_encoder = encoder;
        }
        if let Some(level) = lookup("VOUCH_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.directory.validate()?;
        self.authenticator.validate()?;
        self.logging.validate()
    }
}

/// Directory connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// LDAP server URL (ldap:// or ldaps://)
    #[serde(default = "default_ldap_url")]
    pub url: String,

    /// Root of every relative DN handed to the directory
    /// Example: "dc=example,dc=com"
    #[serde(default)]
    pub base_dn: String,

    /// DN used to bind before reads and compares; anonymous when absent
    #[serde(default)]
    pub manager_dn: Option<String>,

    #[serde(default)]
    pub manager_password: Option<String>,

    /// Use STARTTLS for connection upgrade
    #[serde(default)]
    pub start_tls: bool,

    /// Connect and per-operation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_ldap_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: default_ldap_url(),
            base_dn: String::new(),
            manager_dn: None,
            manager_password: None,
            start_tls: false,
            timeout_seconds: default_timeout(),
        }
    }
}

impl DirectoryConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.url.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "Directory URL is required".into(),
            ));
        }

        if !self.url.starts_with("ldap://") && !self.url.starts_with("ldaps://") {
            return Err(crate::Error::InvalidConfig(
                "Directory URL must start with ldap:// or ldaps://".into(),
            ));
        }

        if self.manager_dn.is_some() && self.manager_password.is_none() {
            return Err(crate::Error::InvalidConfig(
                "manager_dn is set but manager_password is missing".into(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(crate::Error::InvalidConfig(
                "timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Filter-based user search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSearchConfig {
    /// Search base relative to the directory base DN (empty = the base itself)
    #[serde(default)]
    pub search_base: String,

    /// Search filter, `{0}` is replaced with the escaped username
    #[serde(default = "default_user_filter")]
    pub filter: String,

    /// Search the whole subtree instead of one level
    #[serde(default = "default_true")]
    pub search_subtree: bool,
}

fn default_user_filter() -> String {
    "(uid={0})".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for UserSearchConfig {
    fn default() -> Self {
        Self {
            search_base: String::new(),
            filter: default_user_filter(),
            search_subtree: true,
        }
    }
}

/// Password comparison authenticator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatorConfig {
    /// DN patterns relative to the base DN, tried in order
    /// Example: ["uid={0},ou=people"]
    #[serde(default)]
    pub user_dn_patterns: Vec<String>,

    #[serde(default)]
    pub user_search: Option<UserSearchConfig>,

    /// Attributes to read for the user; all user attributes when absent
    #[serde(default)]
    pub user_attributes: Option<Vec<String>>,

    #[serde(default = "default_password_attribute")]
    pub password_attribute: String,

    /// One of `plaintext`, `sha`, `md5`
    #[serde(default = "default_password_encoder")]
    pub password_encoder: String,

    /// Plaintext encoder only
    #[serde(default)]
    pub ignore_password_case: bool,

    /// Drop the stored credential from the identity after local comparison
    #[serde(default)]
    pub erase_credentials: bool,
}

fn default_password_attribute() -> String {
    DEFAULT_PASSWORD_ATTRIBUTE.to_string()
}

fn default_password_encoder() -> String {
    "sha".to_string()
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            user_dn_patterns: Vec::new(),
            user_search: None,
            user_attributes: None,
            password_attribute: default_password_attribute(),
            password_encoder: default_password_encoder(),
            ignore_password_case: false,
            erase_credentials: false,
        }
    }
}

impl AuthenticatorConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.user_dn_patterns.is_empty() && self.user_search.is_none() {
            return Err(crate::Error::InvalidConfig(
                "Either user_dn_patterns or user_search must be configured".into(),
            ));
        }

        for pattern in &self.user_dn_patterns {
            if !pattern.contains(USERNAME_PLACEHOLDER) {
                return Err(crate::Error::InvalidConfig(format!(
                    "DN pattern '{}' must contain the {} placeholder",
                    pattern, USERNAME_PLACEHOLDER
                )));
            }
        }

        if let Some(search) = &self.user_search {
            if !search.filter.contains(USERNAME_PLACEHOLDER) {
                return Err(crate::Error::InvalidConfig(format!(
                    "User search filter must contain the {} placeholder",
                    USERNAME_PLACEHOLDER
                )));
            }
        }

        if self.password_attribute.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "password_attribute must not be empty".into(),
            ));
        }

        let encoder = self.password_encoder.to_ascii_lowercase();
        if !KNOWN_PASSWORD_ENCODERS.contains(&encoder.as_str()) {
            return Err(crate::Error::InvalidConfig(format!(
                "Unknown password encoder '{}'",
                self.password_encoder
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> crate::Result<()> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(crate::Error::InvalidConfig(format!(
                "Unknown log format '{}'",
                other
            ))),
        }
    }
}
