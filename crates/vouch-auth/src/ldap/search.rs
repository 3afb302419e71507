//! User search strategies
//!
//! Locates a user's entry with a directory search when DN patterns alone
//! cannot.

use crate::ldap::directory::{ContextSource, DirectoryContext};
use crate::ldap::error::{DirectoryError, DirectoryResult};
use crate::ldap::types::{DirectoryEntry, SearchScope};
use async_trait::async_trait;
use ldap3::ldap_escape;
use std::sync::Arc;
use tracing::debug;
use vouch_core::config::UserSearchConfig;
use vouch_core::USERNAME_PLACEHOLDER;

/// Finds the directory entry for a username
#[async_trait]
pub trait UserSearch: Send + Sync {
    /// Zero or one entry; an empty result is not an error
    async fn search_for_user(&self, username: &str) -> DirectoryResult<Option<DirectoryEntry>>;
}

/// Searches with a filter such as `(uid={0})`, where `{0}` is replaced by the
/// escaped username.
pub struct FilterBasedUserSearch<S: ContextSource> {
    source: Arc<S>,
    search_base: String,
    filter: String,
    scope: SearchScope,
    return_attributes: Option<Vec<String>>,
}

impl<S: ContextSource> FilterBasedUserSearch<S> {
    pub fn new(source: Arc<S>, search_base: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            source,
            search_base: search_base.into(),
            filter: filter.into(),
            scope: SearchScope::Subtree,
            return_attributes: None,
        }
    }

    pub fn from_config(source: Arc<S>, config: &UserSearchConfig) -> Self {
        Self::new(source, config.search_base.clone(), config.filter.clone())
            .with_subtree(config.search_subtree)
    }

    /// Search the whole subtree below the base, or only one level
    pub fn with_subtree(mut self, subtree: bool) -> Self {
        self.scope = if subtree {
            SearchScope::Subtree
        } else {
            SearchScope::OneLevel
        };
        self
    }

    pub fn with_return_attributes(mut self, attributes: Vec<String>) -> Self {
        self.return_attributes = Some(attributes);
        self
    }

    pub fn build_filter(&self, username: &str) -> String {
        self.filter
            .replace(USERNAME_PLACEHOLDER, &ldap_escape(username))
    }
}

#[async_trait]
impl<S: ContextSource> UserSearch for FilterBasedUserSearch<S> {
    async fn search_for_user(&self, username: &str) -> DirectoryResult<Option<DirectoryEntry>> {
        let filter = self.build_filter(username);

        debug!(
            "Searching for user with filter {} below '{}'",
            filter, self.search_base
        );

        let mut ctx = self.source.context().await?;
        let mut entries = ctx
            .search(
                &self.search_base,
                &filter,
                self.scope,
                self.return_attributes.as_deref(),
            )
            .await?;

        match entries.len() {
            0 => {
                debug!("User search returned no entries");
                Ok(None)
            }
            1 => Ok(entries.pop()),
            count => Err(DirectoryError::AmbiguousSearch { filter, count }),
        }
    }
}
