//! Directory collaborator traits
//!
//! A [`ContextSource`] hands out bound [`DirectoryContext`]s. Every context
//! owns its own connection and releases it when dropped, so an
//! authentication call holding one cannot leak it on any exit path.

use crate::ldap::error::DirectoryResult;
use crate::ldap::types::{AttributeSet, DirectoryEntry, DirectoryLocation, SearchScope};
use async_trait::async_trait;

/// Bound connection to a directory
#[async_trait]
pub trait DirectoryContext: Send {
    /// Read the attributes of the entry at `location`.
    ///
    /// `attributes` restricts the returned set; `None` asks for the
    /// directory's default set. Returns `Ok(None)` when no entry exists.
    async fn read_attributes(
        &mut self,
        location: &DirectoryLocation,
        attributes: Option<&[String]>,
    ) -> DirectoryResult<Option<AttributeSet>>;

    /// Ask the directory whether `attribute` of the entry holds `value`
    async fn compare(
        &mut self,
        location: &DirectoryLocation,
        attribute: &str,
        value: &[u8],
    ) -> DirectoryResult<bool>;

    /// Search below `base` (relative to the base DN)
    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        scope: SearchScope,
        attributes: Option<&[String]>,
    ) -> DirectoryResult<Vec<DirectoryEntry>>;
}

/// Supplies bound directory contexts rooted at a base DN
#[async_trait]
pub trait ContextSource: Send + Sync {
    type Context: DirectoryContext + 'static;

    fn base_dn(&self) -> &str;

    async fn context(&self) -> DirectoryResult<Self::Context>;
}
