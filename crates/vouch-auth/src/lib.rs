//! Directory authentication for Vouch

pub mod ldap;

pub use ldap::{
    AuthError, AuthResult, AttributeSet, ContextSource, DirectoryError, DirectoryLocation,
    DnResolver, FilterBasedUserSearch, Identity, IdentityMapper, InMemoryDirectory,
    LdapContextSource, LdapIdentityMapper, PasswordComparisonAuthenticator, UserSearch,
};
pub use vouch_crypto::PasswordEncoder;
