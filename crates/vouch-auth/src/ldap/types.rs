//! Directory types shared by the resolver, the verifier and the
//! directory collaborators.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ============================================================================
// Directory Location
// ============================================================================

/// Address of an entry in the directory (a distinguished name).
///
/// May be relative to the base DN of the directory it is used against;
/// [`DirectoryLocation::qualify`] produces the absolute form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryLocation(String);

impl DirectoryLocation {
    pub fn new(dn: impl Into<String>) -> Self {
        Self(dn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute DN of this location below `base_dn`.
    ///
    /// A location that already ends with the base DN is returned unchanged.
    pub fn qualify(&self, base_dn: &str) -> String {
        if base_dn.is_empty() {
            return self.0.clone();
        }
        if self.0.is_empty() {
            return base_dn.to_string();
        }
        if self.is_within(base_dn) {
            return self.0.clone();
        }
        format!("{},{}", self.0, base_dn)
    }

    /// Whether this DN is `base_dn` itself or lies below it
    pub fn is_within(&self, base_dn: &str) -> bool {
        let dn = normalize_dn(&self.0);
        let base = normalize_dn(base_dn);
        base.is_empty() || dn == base || dn.ends_with(&format!(",{}", base))
    }

    /// Case- and whitespace-insensitive equality of two DNs
    pub fn same_entry(&self, other: &DirectoryLocation) -> bool {
        normalize_dn(&self.0) == normalize_dn(&other.0)
    }
}

impl fmt::Display for DirectoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DirectoryLocation {
    fn from(dn: &str) -> Self {
        Self::new(dn)
    }
}

impl From<String> for DirectoryLocation {
    fn from(dn: String) -> Self {
        Self(dn)
    }
}

/// Lower-case a DN and strip the spaces around its `,` and `=` separators
pub fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| {
            rdn.split('=')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("=")
        })
        .collect::<Vec<_>>()
        .join(",")
        .to_lowercase()
}

// ============================================================================
// Attributes
// ============================================================================

/// A single directory attribute with its values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

/// Attribute name to values mapping with case-insensitive names.
///
/// The name under which an attribute was first inserted is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct AttributeSet {
    attrs: BTreeMap<String, Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        let key = name.to_lowercase();
        match self.attrs.get_mut(&key) {
            Some(existing) => existing.values = values,
            None => {
                self.attrs.insert(key, Attribute { name, values });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attrs
            .get(&name.to_lowercase())
            .map(|attr| attr.values.as_slice())
    }

    /// First value of an attribute
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(&name.to_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.attrs
            .remove(&name.to_lowercase())
            .map(|attr| attr.values)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attrs.values().map(|attr| attr.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.attrs
            .values()
            .map(|attr| (attr.name.as_str(), attr.values.as_slice()))
    }

    /// Copy of this set restricted to `names`; unknown names are skipped
    pub fn select(&self, names: &[String]) -> AttributeSet {
        let mut selected = AttributeSet::new();
        for name in names {
            if let Some(attr) = self.attrs.get(&name.to_lowercase()) {
                selected.insert(attr.name.clone(), attr.values.clone());
            }
        }
        selected
    }
}

impl FromIterator<(String, Vec<String>)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut set = AttributeSet::new();
        for (name, values) in iter {
            set.insert(name, values);
        }
        set
    }
}

impl From<HashMap<String, Vec<String>>> for AttributeSet {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, Vec<String>>> for AttributeSet {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        map.into_iter().collect()
    }
}

impl From<AttributeSet> for BTreeMap<String, Vec<String>> {
    fn from(set: AttributeSet) -> Self {
        set.attrs
            .into_values()
            .map(|attr| (attr.name, attr.values))
            .collect()
    }
}

// ============================================================================
// Entries and search
// ============================================================================

/// An entry returned by a directory search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub dn: DirectoryLocation,

    #[serde(default)]
    pub attributes: AttributeSet,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<DirectoryLocation>, attributes: AttributeSet) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Base,
    OneLevel,
    #[default]
    Subtree,
}

// ============================================================================
// Authenticated Identity
// ============================================================================

/// Result of a successful authentication.
#[derive(Clone, Serialize)]
pub struct Identity {
    pub username: String,

    pub location: DirectoryLocation,

    pub attributes: AttributeSet,

    /// Stored credential, only present when it was read during local comparison
    #[serde(skip)]
    pub password: Option<String>,
}

impl Identity {
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name)
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Drop the stored credential
    pub fn erase_credentials(&mut self) {
        self.password = None;
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("location", &self.location)
            .field("attributes", &self.attributes.names().collect::<Vec<_>>())
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
