//! Vouch Core Library
//!
//! Shared error type and configuration for the Vouch LDAP authenticator.

pub mod config;
pub mod error;

pub use config::VouchConfig;
pub use error::{Error, Result};

/// Vouch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder substituted with the username in DN patterns and search filters
pub const USERNAME_PLACEHOLDER: &str = "{0}";

/// Default name of the attribute holding a user's password
pub const DEFAULT_PASSWORD_ATTRIBUTE: &str = "userPassword";
