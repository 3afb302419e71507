//! LDAP client implementation
//!
//! Opens one connection per context, optionally binding as the manager
//! account. Supports LDAP, LDAPS (SSL) and STARTTLS connections.

use crate::ldap::directory::{ContextSource, DirectoryContext};
use crate::ldap::error::*;
use crate::ldap::types::*;
use async_trait::async_trait;
use ldap3::result::CompareResult;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchResult};
use std::time::Duration;
use tracing::{debug, info};
use vouch_core::config::DirectoryConfig;

/// Filter matching any entry, used for base-scope reads
const ANY_OBJECT_FILTER: &str = "(objectClass=*)";

/// Attribute selector for "no attributes" (RFC 4511, 4.5.1.8)
const NO_ATTRIBUTES: &str = "1.1";

/// Context source backed by a real LDAP server
pub struct LdapContextSource {
    config: DirectoryConfig,
}

impl LdapContextSource {
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        config
            .validate()
            .map_err(|e| DirectoryError::Connection(e.to_string()))?;

        info!(
            "Using LDAP directory {} with base DN '{}'",
            config.url, config.base_dn
        );
        Ok(Self { config })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    /// Create LDAP connection with proper TLS settings
    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout())
            .set_starttls(self.config.start_tls);

        debug!("Connecting to LDAP server: {}", self.config.url);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|e| DirectoryError::Connection(e.to_string()))?;

        ldap3::drive!(conn);

        if let Some(manager_dn) = &self.config.manager_dn {
            let password = self.config.manager_password.as_deref().unwrap_or_default();
            let result = ldap
                .with_timeout(self.timeout())
                .simple_bind(manager_dn, password)
                .await?;

            if result.rc != 0 {
                return Err(DirectoryError::Bind {
                    rc: result.rc,
                    message: result.text,
                });
            }
        }

        Ok(ldap)
    }
}

#[async_trait]
impl ContextSource for LdapContextSource {
    type Context = LdapContext;

    fn base_dn(&self) -> &str {
        &self.config.base_dn
    }

    async fn context(&self) -> DirectoryResult<LdapContext> {
        let ldap = self.create_connection().await?;
        Ok(LdapContext {
            ldap,
            base_dn: self.config.base_dn.clone(),
            timeout: self.timeout(),
        })
    }
}

/// Bound LDAP connection. Dropping the context closes the connection.
pub struct LdapContext {
    ldap: Ldap,
    base_dn: String,
    timeout: Duration,
}

impl LdapContext {
    fn attribute_selector(attributes: Option<&[String]>) -> Vec<&str> {
        match attributes {
            None => vec!["*"],
            Some([]) => vec![NO_ATTRIBUTES],
            Some(list) => list.iter().map(String::as_str).collect(),
        }
    }

    /// Outcome of a compare result code; `None` is a fault.
    ///
    /// A missing attribute cannot hold the value, so it is a mismatch.
    fn compare_outcome(rc: u32) -> Option<bool> {
        match rc {
            RC_COMPARE_TRUE => Some(true),
            RC_COMPARE_FALSE | RC_NO_SUCH_ATTRIBUTE => Some(false),
            _ => None,
        }
    }
}

#[async_trait]
impl DirectoryContext for LdapContext {
    async fn read_attributes(
        &mut self,
        location: &DirectoryLocation,
        attributes: Option<&[String]>,
    ) -> DirectoryResult<Option<AttributeSet>> {
        let dn = location.qualify(&self.base_dn);
        let attrs = Self::attribute_selector(attributes);

        let SearchResult(entries, result) = self
            .ldap
            .with_timeout(self.timeout)
            .search(&dn, Scope::Base, ANY_OBJECT_FILTER, attrs)
            .await?;

        if result.rc == RC_NO_SUCH_OBJECT {
            debug!("No entry at {}", dn);
            return Ok(None);
        }
        if result.rc != 0 {
            return Err(DirectoryError::from_ldap_result(result));
        }

        Ok(entries
            .into_iter()
            .next()
            .map(|entry| AttributeSet::from(SearchEntry::construct(entry).attrs)))
    }

    async fn compare(
        &mut self,
        location: &DirectoryLocation,
        attribute: &str,
        value: &[u8],
    ) -> DirectoryResult<bool> {
        let dn = location.qualify(&self.base_dn);

        let CompareResult(result) = self
            .ldap
            .with_timeout(self.timeout)
            .compare(&dn, attribute, value)
            .await?;

        match Self::compare_outcome(result.rc) {
            Some(equal) => Ok(equal),
            None => Err(DirectoryError::from_ldap_result(result)),
        }
    }

    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        scope: SearchScope,
        attributes: Option<&[String]>,
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        let base = DirectoryLocation::new(base).qualify(&self.base_dn);
        let scope = match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        };

        debug!("Searching {} with filter: {}", base, filter);

        let SearchResult(entries, result) = self
            .ldap
            .with_timeout(self.timeout)
            .search(&base, scope, filter, Self::attribute_selector(attributes))
            .await?;

        if result.rc != 0 {
            return Err(DirectoryError::from_ldap_result(result));
        }

        Ok(entries
            .into_iter()
            .map(|entry| {
                let entry = SearchEntry::construct(entry);
                DirectoryEntry::new(entry.dn, AttributeSet::from(entry.attrs))
            })
            .collect())
    }
}
