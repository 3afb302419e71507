//! In-memory directory
//!
//! A [`ContextSource`] over a fixed set of entries, for embedding, offline
//! configuration checks and tests. DNs and attribute names match
//! case-insensitively; compare is an exact octet match, as for
//! `userPassword`. Search filters support equality, presence, `&`, `|`
//! and `!`.

use crate::ldap::directory::{ContextSource, DirectoryContext};
use crate::ldap::error::*;
use crate::ldap::types::*;
use async_trait::async_trait;
use ldap3_proto::parse_ldap_filter_str;
use ldap3_proto::proto::LdapFilter;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// JSON document accepted by [`InMemoryDirectory::from_json`]
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryFixture {
    pub base_dn: String,

    #[serde(default)]
    pub entries: Vec<DirectoryEntry>,
}

#[derive(Default)]
struct OperationCounts {
    contexts: AtomicUsize,
    reads: AtomicUsize,
    compares: AtomicUsize,
    searches: AtomicUsize,
}

struct Inner {
    base_dn: String,
    entries: RwLock<BTreeMap<String, DirectoryEntry>>,
    counts: OperationCounts,
    unavailable: AtomicBool,
}

/// Shared handle to an in-memory entry store
#[derive(Clone)]
pub struct InMemoryDirectory {
    inner: Arc<Inner>,
}

impl InMemoryDirectory {
    pub fn new(base_dn: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                base_dn: base_dn.into(),
                entries: RwLock::new(BTreeMap::new()),
                counts: OperationCounts::default(),
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_fixture(fixture: DirectoryFixture) -> Self {
        let directory = Self::new(fixture.base_dn);
        for entry in fixture.entries {
            directory.add_entry(entry);
        }
        directory
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let fixture: DirectoryFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Add or replace an entry; relative DNs are placed below the base DN
    pub fn add_entry(&self, entry: DirectoryEntry) {
        let dn = DirectoryLocation::new(entry.dn.qualify(&self.inner.base_dn));
        let key = normalize_dn(dn.as_str());
        self.inner.entries.write().insert(
            key,
            DirectoryEntry {
                dn,
                attributes: entry.attributes,
            },
        );
    }

    pub fn insert(&self, dn: &str, attributes: AttributeSet) {
        self.add_entry(DirectoryEntry::new(dn, attributes));
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulate an outage: while set, every operation fails with a
    /// connection error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn context_count(&self) -> usize {
        self.inner.counts.contexts.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.inner.counts.reads.load(Ordering::SeqCst)
    }

    pub fn compare_count(&self) -> usize {
        self.inner.counts.compares.load(Ordering::SeqCst)
    }

    pub fn search_count(&self) -> usize {
        self.inner.counts.searches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> DirectoryResult<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Connection(
                "in-memory directory marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lookup(&self, location: &DirectoryLocation) -> Option<DirectoryEntry> {
        let key = normalize_dn(&location.qualify(&self.inner.base_dn));
        self.inner.entries.read().get(&key).cloned()
    }
}

fn select(attributes: &AttributeSet, names: Option<&[String]>) -> AttributeSet {
    match names {
        Some(names) => attributes.select(names),
        None => attributes.clone(),
    }
}

fn parse_filter(filter: &str) -> DirectoryResult<LdapFilter> {
    parse_ldap_filter_str(filter).map_err(|_| DirectoryError::InvalidFilter(filter.to_string()))
}

/// Evaluate `filter` against an entry's attributes.
///
/// Equality is case-insensitive on every value. Every branch is evaluated;
/// unsupported match types are `InvalidFilter`.
fn filter_matches(filter: &LdapFilter, attributes: &AttributeSet) -> DirectoryResult<bool> {
    let all = |filters: &[LdapFilter]| {
        filters
            .iter()
            .map(|f| filter_matches(f, attributes))
            .collect::<DirectoryResult<Vec<bool>>>()
    };

    match filter {
        LdapFilter::And(filters) => Ok(all(filters.as_slice())?.into_iter().all(|m| m)),
        LdapFilter::Or(filters) => Ok(all(filters.as_slice())?.into_iter().any(|m| m)),
        LdapFilter::Not(inner) => Ok(!filter_matches(inner, attributes)?),
        LdapFilter::Present(attr) => Ok(attributes.contains(attr)),
        LdapFilter::Equality(attr, value) => Ok(attributes
            .get(attr)
            .map(|values| {
                let value = value.to_lowercase();
                values.iter().any(|v| v.to_lowercase() == value)
            })
            .unwrap_or(false)),
        other => Err(DirectoryError::InvalidFilter(format!(
            "unsupported filter {:?}",
            other
        ))),
    }
}

/// Whether `dn` (normalized) is within `scope` of `base` (normalized)
fn in_scope(dn: &str, base: &str, scope: SearchScope) -> bool {
    if dn == base {
        return scope != SearchScope::OneLevel;
    }

    let rdns = if base.is_empty() {
        dn
    } else {
        match dn.strip_suffix(base).and_then(|rest| rest.strip_suffix(',')) {
            Some(rest) => rest,
            None => return false,
        }
    };

    match scope {
        SearchScope::Base => false,
        SearchScope::OneLevel => !rdns.contains(','),
        SearchScope::Subtree => true,
    }
}

#[async_trait]
impl ContextSource for InMemoryDirectory {
    type Context = InMemoryContext;

    fn base_dn(&self) -> &str {
        &self.inner.base_dn
    }

    async fn context(&self) -> DirectoryResult<InMemoryContext> {
        self.check_available()?;
        self.inner.counts.contexts.fetch_add(1, Ordering::SeqCst);
        Ok(InMemoryContext {
            directory: self.clone(),
        })
    }
}

pub struct InMemoryContext {
    directory: InMemoryDirectory,
}

#[async_trait]
impl DirectoryContext for InMemoryContext {
    async fn read_attributes(
        &mut self,
        location: &DirectoryLocation,
        attributes: Option<&[String]>,
    ) -> DirectoryResult<Option<AttributeSet>> {
        self.directory.check_available()?;
        self.directory.inner.counts.reads.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .directory
            .lookup(location)
            .map(|entry| select(&entry.attributes, attributes)))
    }

    async fn compare(
        &mut self,
        location: &DirectoryLocation,
        attribute: &str,
        value: &[u8],
    ) -> DirectoryResult<bool> {
        self.directory.check_available()?;
        self.directory.inner.counts.compares.fetch_add(1, Ordering::SeqCst);

        let entry = self
            .directory
            .lookup(location)
            .ok_or_else(|| DirectoryError::Protocol {
                rc: RC_NO_SUCH_OBJECT,
                message: format!("No such object: {}", location),
            })?;

        Ok(entry
            .attributes
            .get(attribute)
            .map(|values| values.iter().any(|v| v.as_bytes() == value))
            .unwrap_or(false))
    }

    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        scope: SearchScope,
        attributes: Option<&[String]>,
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        self.directory.check_available()?;
        self.directory.inner.counts.searches.fetch_add(1, Ordering::SeqCst);

        let filter = parse_filter(filter)?;
        // Rejects unsupported match types before any entry is scanned
        filter_matches(&filter, &AttributeSet::new())?;

        let base = normalize_dn(&DirectoryLocation::new(base).qualify(&self.directory.inner.base_dn));

        debug!("In-memory search below '{}' with {:?}", base, filter);

        let entries = self.directory.inner.entries.read();
        let mut found = Vec::new();
        for (dn, entry) in entries.iter() {
            if in_scope(dn, &base, scope) && filter_matches(&filter, &entry.attributes)? {
                found.push(DirectoryEntry {
                    dn: entry.dn.clone(),
                    attributes: select(&entry.attributes, attributes),
                });
            }
        }
        Ok(found)
    }
}
