//! LDAP password comparison authentication
//!
//! Provides:
//! - Candidate DN resolution from patterns and user searches
//! - Local or directory-side password comparison
//! - An ldap3-backed context source and an in-memory directory
//!
//! Features:
//! - Attribute allow-lists
//! - RFC 2307 password schemes
//! - TLS/STARTTLS support

mod authenticator;
mod client;
mod directory;
mod error;
mod mapper;
mod memory;
mod resolver;
mod search;
mod types;

pub use authenticator::{AuthenticatorBuilder, PasswordComparisonAuthenticator};
pub use client::{LdapContext, LdapContextSource};
pub use directory::{ContextSource, DirectoryContext};
pub use error::*;
pub use mapper::{IdentityMapper, LdapIdentityMapper};
pub use memory::{DirectoryFixture, InMemoryContext, InMemoryDirectory};
pub use resolver::DnResolver;
pub use search::{FilterBasedUserSearch, UserSearch};
pub use types::*;
