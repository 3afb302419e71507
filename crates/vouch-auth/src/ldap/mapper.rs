//! Identity mapping
//!
//! Converts the attributes read for an authenticated entry into an
//! [`Identity`].

use crate::ldap::types::{AttributeSet, DirectoryLocation, Identity};
use vouch_core::DEFAULT_PASSWORD_ATTRIBUTE;

pub trait IdentityMapper: Send + Sync {
    fn map_identity(
        &self,
        username: &str,
        location: &DirectoryLocation,
        attributes: AttributeSet,
    ) -> Identity;
}

/// Keeps every attribute and takes the password from `password_attribute`
#[derive(Debug, Clone)]
pub struct LdapIdentityMapper {
    password_attribute: String,
}

impl LdapIdentityMapper {
    pub fn new(password_attribute: impl Into<String>) -> Self {
        Self {
            password_attribute: password_attribute.into(),
        }
    }

    pub fn password_attribute(&self) -> &str {
        &self.password_attribute
    }
}

impl Default for LdapIdentityMapper {
    fn default() -> Self {
        Self::new(DEFAULT_PASSWORD_ATTRIBUTE)
    }
}

impl IdentityMapper for LdapIdentityMapper {
    fn map_identity(
        &self,
        username: &str,
        location: &DirectoryLocation,
        attributes: AttributeSet,
    ) -> Identity {
        let password = attributes
            .first(&self.password_attribute)
            .map(String::from);

        Identity {
            username: username.to_string(),
            location: location.clone(),
            attributes,
            password,
        }
    }
}
