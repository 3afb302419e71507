//! DN resolution
//!
//! Turns a username into the ordered list of directory locations to try:
//! one per configured DN pattern, then the user search result if a search
//! is configured.

use crate::ldap::error::{AuthError, AuthResult, DirectoryResult};
use crate::ldap::search::UserSearch;
use crate::ldap::types::DirectoryLocation;
use ldap3::dn_escape;
use std::sync::Arc;
use tracing::debug;
use vouch_core::USERNAME_PLACEHOLDER;

#[derive(Clone, Default)]
pub struct DnResolver {
    base_dn: String,
    patterns: Vec<String>,
    user_search: Option<Arc<dyn UserSearch>>,
}

impl DnResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base DN that relative pattern locations are qualified against when
    /// checking them against a search result
    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = base_dn.into();
        self
    }

    /// Patterns such as `uid={0},ou=people`, tried in the given order
    pub fn with_patterns<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user_search(mut self, search: Arc<dyn UserSearch>) -> Self {
        self.user_search = Some(search);
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn has_user_search(&self) -> bool {
        self.user_search.is_some()
    }

    /// Checked once when the authenticator is built
    pub fn validate(&self) -> AuthResult<()> {
        if self.patterns.is_empty() && self.user_search.is_none() {
            return Err(AuthError::configuration(
                "Either DN patterns or a user search must be configured",
            ));
        }

        if let Some(pattern) = self
            .patterns
            .iter()
            .find(|p| !p.contains(USERNAME_PLACEHOLDER))
        {
            return Err(AuthError::configuration(format!(
                "DN pattern '{}' must contain the {} placeholder",
                pattern, USERNAME_PLACEHOLDER
            )));
        }

        Ok(())
    }

    /// Locations derived from the DN patterns alone. No directory I/O.
    pub fn user_dns(&self, username: &str) -> Vec<DirectoryLocation> {
        let escaped = dn_escape(username);
        self.patterns
            .iter()
            .map(|pattern| DirectoryLocation::new(pattern.replace(USERNAME_PLACEHOLDER, &escaped)))
            .collect()
    }

    /// All candidate locations for `username`, in trial order.
    ///
    /// An empty list means the user cannot be located; it is not an error.
    pub async fn resolve(&self, username: &str) -> DirectoryResult<Vec<DirectoryLocation>> {
        let mut locations = self.user_dns(username);

        if let Some(search) = &self.user_search {
            if let Some(entry) = search.search_for_user(username).await? {
                let found = DirectoryLocation::new(entry.dn.qualify(&self.base_dn));
                if locations
                    .iter()
                    .any(|l| DirectoryLocation::new(l.qualify(&self.base_dn)).same_entry(&found))
                {
                    debug!("User search result {} already covered by DN patterns", entry.dn);
                } else {
                    locations.push(entry.dn);
                }
            }
        }

        debug!("Resolved {} candidate location(s) for {}", locations.len(), username);
        Ok(locations)
    }
}
