//! Error types for directory access and authentication.
//!
//! Messages never carry passwords or stored credential values.

use thiserror::Error;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

pub type AuthResult<T> = Result<T, AuthError>;

/// LDAP result code: noSuchAttribute
pub const RC_NO_SUCH_ATTRIBUTE: u32 = 16;

/// LDAP result code: noSuchObject
pub const RC_NO_SUCH_OBJECT: u32 = 32;

/// LDAP result code: compareFalse
pub const RC_COMPARE_FALSE: u32 = 5;

/// LDAP result code: compareTrue
pub const RC_COMPARE_TRUE: u32 = 6;

/// Faults raised by a directory collaborator
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to connect to directory: {0}")]
    Connection(String),

    #[error("Directory bind failed with code {rc}: {message}")]
    Bind { rc: u32, message: String },

    #[error("Directory operation failed with code {rc}: {message}")]
    Protocol { rc: u32, message: String },

    #[error("Search with filter {filter} returned {count} entries, expected at most one")]
    AmbiguousSearch { filter: String, count: usize },

    #[error("Invalid search filter: {0}")]
    InvalidFilter(String),

    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),
}

impl DirectoryError {
    pub(crate) fn from_ldap_result(result: ldap3::LdapResult) -> Self {
        DirectoryError::Protocol {
            rc: result.rc,
            message: result.text,
        }
    }
}

/// Outcome of a failed authentication call
#[derive(Debug, Error)]
pub enum AuthError {
    /// Raised while building the authenticator, never per call
    #[error("Authenticator configuration error: {0}")]
    Configuration(String),

    /// No candidate location could be produced for the username
    #[error("User not found")]
    NotFound { username: String },

    /// Candidate locations existed but none verified
    #[error("Bad credentials")]
    BadCredentials,

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(#[from] DirectoryError),
}

impl AuthError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        AuthError::Configuration(msg.into())
    }

    /// Whether this is an authentication outcome rather than a fault
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, AuthError::NotFound { .. } | AuthError::BadCredentials)
    }

    /// Message safe to return to a remote caller.
    ///
    /// `NotFound` and `BadCredentials` are indistinguishable here.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::NotFound { .. } | AuthError::BadCredentials => "Authentication failed",
            AuthError::Configuration(_) => "Authentication service misconfigured",
            AuthError::DirectoryUnavailable(_) => "Authentication service unavailable",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "ConfigurationError",
            AuthError::NotFound { .. } => "NotFound",
            AuthError::BadCredentials => "BadCredentials",
            AuthError::DirectoryUnavailable(_) => "DirectoryUnavailable",
        }
    }
}

impl From<vouch_core::Error> for AuthError {
    fn from(err: vouch_core::Error) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
