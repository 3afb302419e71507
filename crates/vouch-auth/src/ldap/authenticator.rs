//! Password comparison authenticator
//!
//! Verifies a username/password pair against the directory without binding
//! as the user:
//! 1. Resolve candidate locations (DN patterns, then user search)
//! 2. Read each candidate's attributes
//! 3. Compare the password locally when the stored value was returned,
//!    otherwise ask the directory to compare it
//!
//! The first candidate that verifies wins.

use crate::ldap::directory::{ContextSource, DirectoryContext};
use crate::ldap::error::{AuthError, AuthResult};
use crate::ldap::mapper::{IdentityMapper, LdapIdentityMapper};
use crate::ldap::resolver::DnResolver;
use crate::ldap::search::{FilterBasedUserSearch, UserSearch};
use crate::ldap::types::{AttributeSet, DirectoryLocation, Identity};
use std::sync::Arc;
use tracing::debug;
use vouch_core::config::AuthenticatorConfig;
use vouch_core::DEFAULT_PASSWORD_ATTRIBUTE;
use vouch_crypto::{encoder_for_name, LdapDigestPasswordEncoder, PasswordEncoder};

/// How the password is checked against one candidate entry
#[derive(Debug)]
enum Verification<'a> {
    /// The stored values were read and are matched by the encoder
    LocalComparison(&'a [String]),
    /// The stored value was not returned; the directory compares it
    DirectoryCompare,
}

impl<'a> Verification<'a> {
    fn select(attributes: &'a AttributeSet, password_attribute: &str) -> Self {
        match attributes.get(password_attribute) {
            Some(values) if !values.is_empty() => Verification::LocalComparison(values),
            _ => Verification::DirectoryCompare,
        }
    }
}

pub struct PasswordComparisonAuthenticator<S: ContextSource> {
    source: Arc<S>,
    resolver: DnResolver,
    user_attributes: Option<Vec<String>>,
    password_attribute: String,
    password_encoder: Arc<dyn PasswordEncoder>,
    identity_mapper: Arc<dyn IdentityMapper>,
    erase_credentials: bool,
}

impl<S: ContextSource> PasswordComparisonAuthenticator<S> {
    pub fn builder(source: Arc<S>) -> AuthenticatorBuilder<S> {
        let resolver = DnResolver::new().with_base_dn(source.base_dn());
        AuthenticatorBuilder {
            source,
            resolver,
            user_attributes: None,
            password_attribute: DEFAULT_PASSWORD_ATTRIBUTE.to_string(),
            password_encoder: Arc::new(LdapDigestPasswordEncoder::sha()),
            identity_mapper: None,
            erase_credentials: false,
        }
    }

    /// Build from the `[authenticator]` configuration section
    pub fn from_config(source: Arc<S>, config: &AuthenticatorConfig) -> AuthResult<Self>
    where
        S: 'static,
    {
        config.validate()?;

        let encoder = encoder_for_name(&config.password_encoder, config.ignore_password_case);
        let mut builder = Self::builder(source.clone())
            .user_dn_patterns(config.user_dn_patterns.iter().cloned())
            .password_attribute(config.password_attribute.clone())
            .erase_credentials_after_authentication(config.erase_credentials)
            .password_encoder(encoder)?;

        if let Some(attributes) = &config.user_attributes {
            builder = builder.user_attributes(attributes.iter().cloned());
        }
        if let Some(search) = &config.user_search {
            builder = builder.user_search(Arc::new(FilterBasedUserSearch::from_config(source, search)));
        }

        builder.build()
    }

    pub fn resolver(&self) -> &DnResolver {
        &self.resolver
    }

    /// Locations derived from the DN patterns for `username`
    pub fn user_dns(&self, username: &str) -> Vec<DirectoryLocation> {
        self.resolver.user_dns(username)
    }

    /// Verify `password` for `username` and return the authenticated identity.
    ///
    /// Fails with `NotFound` when no candidate location exists, with
    /// `BadCredentials` when none of them verifies, and with
    /// `DirectoryUnavailable` on any directory fault.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<Identity> {
        let candidates = self.resolver.resolve(username).await?;

        if candidates.is_empty() {
            debug!("No candidate location for user: {}", username);
            return Err(AuthError::NotFound {
                username: username.to_string(),
            });
        }

        let mut ctx = self.source.context().await?;

        for location in &candidates {
            debug!("Trying location {} for user {}", location, username);

            let Some(attributes) = ctx
                .read_attributes(location, self.user_attributes.as_deref())
                .await?
            else {
                debug!("No entry at {}, trying next location", location);
                continue;
            };

            let verification = Verification::select(&attributes, &self.password_attribute);
            let directory_compare = matches!(verification, Verification::DirectoryCompare);

            let verified = match verification {
                Verification::LocalComparison(stored) => {
                    debug!("Comparing password locally for {}", location);
                    stored
                        .iter()
                        .any(|value| self.password_encoder.matches(password, value))
                }
                Verification::DirectoryCompare => {
                    debug!("Password attribute not returned, using directory compare for {}", location);
                    let encoded = self.password_encoder.encode(password);
                    ctx.compare(location, &self.password_attribute, encoded.as_bytes())
                        .await?
                }
            };

            if !verified {
                debug!("Password mismatch at {}", location);
                continue;
            }

            let mut identity = self
                .identity_mapper
                .map_identity(username, location, attributes);
            if directory_compare || self.erase_credentials {
                identity.erase_credentials();
            }

            debug!("Authenticated {} at {}", username, location);
            return Ok(identity);
        }

        Err(AuthError::BadCredentials)
    }
}

pub struct AuthenticatorBuilder<S: ContextSource> {
    source: Arc<S>,
    resolver: DnResolver,
    user_attributes: Option<Vec<String>>,
    password_attribute: String,
    password_encoder: Arc<dyn PasswordEncoder>,
    identity_mapper: Option<Arc<dyn IdentityMapper>>,
    erase_credentials: bool,
}

impl<S: ContextSource> AuthenticatorBuilder<S> {
    pub fn user_dn_patterns<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.resolver = self.resolver.with_patterns(patterns);
        self
    }

    pub fn user_search(mut self, search: Arc<dyn UserSearch>) -> Self {
        self.resolver = self.resolver.with_user_search(search);
        self
    }

    /// Attributes read for each candidate. Leaving the password attribute
    /// out forces directory compare.
    pub fn user_attributes<I, P>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.user_attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn password_attribute(mut self, name: impl Into<String>) -> Self {
        self.password_attribute = name.into();
        self
    }

    /// Never hand out the stored credential, even after local comparison
    pub fn erase_credentials_after_authentication(mut self, erase: bool) -> Self {
        self.erase_credentials = erase;
        self
    }

    /// Replace the password encoder. An absent encoder is rejected.
    pub fn password_encoder(mut self, encoder: Option<Arc<dyn PasswordEncoder>>) -> AuthResult<Self> {
        self.password_encoder =
            encoder.ok_or_else(|| AuthError::configuration("A password encoder is required"))?;
        Ok(self)
    }

    /// Defaults to an [`LdapIdentityMapper`] reading the password attribute
    pub fn identity_mapper(mut self, mapper: Arc<dyn IdentityMapper>) -> Self {
        self.identity_mapper = Some(mapper);
        self
    }

    pub fn build(self) -> AuthResult<PasswordComparisonAuthenticator<S>> {
        self.resolver.validate()?;

        if self.password_attribute.is_empty() {
            return Err(AuthError::configuration("The password attribute name must not be empty"));
        }

        let identity_mapper = self
            .identity_mapper
            .unwrap_or_else(|| Arc::new(LdapIdentityMapper::new(self.password_attribute.clone())));

        Ok(PasswordComparisonAuthenticator {
            source: self.source,
            resolver: self.resolver,
            user_attributes: self.user_attributes,
            password_attribute: self.password_attribute,
            password_encoder: self.password_encoder,
            identity_mapper,
            erase_credentials: self.erase_credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldap::error::{DirectoryError, DirectoryResult};
    use crate::ldap::memory::InMemoryDirectory;
    use crate::ldap::types::DirectoryEntry;
    use async_trait::async_trait;
    use vouch_core::config::UserSearchConfig;
    use vouch_crypto::PlaintextPasswordEncoder;

    const BENS_SHA: &str = "{SHA}nFCebWjxfaLbHHG1Qk5UU4trbvQ=";

    fn attrs(pairs: &[(&str, &[&str])]) -> AttributeSet {
        pairs
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    fn person(uid: &str, cn: &str, sn: &str, password: &str) -> AttributeSet {
        attrs(&[
            (
                "objectClass",
                &["top", "person", "organizationalPerson", "inetOrgPerson"],
            ),
            ("uid", &[uid]),
            ("cn", &[cn]),
            ("sn", &[sn]),
            ("userPassword", &[password]),
        ])
    }

    fn directory() -> Arc<InMemoryDirectory> {
        let directory = InMemoryDirectory::new("dc=acegisecurity,dc=org");
        directory.insert("ou=people", attrs(&[("ou", &["people"])]));
        directory.insert(
            "uid=bob,ou=people",
            person("bob", "Bob Hamilton", "Hamilton", "bobspassword"),
        );
        directory.insert("uid=ben,ou=people", person("ben", "Ben Alex", "Alex", BENS_SHA));
        directory.insert("ou=otherpeople", attrs(&[("ou", &["otherpeople"])]));
        directory.insert(
            "uid=bob,ou=otherpeople",
            person("bob", "Bob Other", "Other", "otherbobspassword"),
        );
        Arc::new(directory)
    }

    fn authenticator(directory: &Arc<InMemoryDirectory>) -> AuthenticatorBuilder<InMemoryDirectory> {
        PasswordComparisonAuthenticator::builder(directory.clone()).user_dn_patterns(["uid={0},ou=people"])
    }

    fn plaintext() -> Option<Arc<dyn PasswordEncoder>> {
        Some(Arc::new(PlaintextPasswordEncoder::default()))
    }

    struct FixedSearch(Option<&'static str>);

    #[async_trait]
    impl UserSearch for FixedSearch {
        async fn search_for_user(&self, _username: &str) -> DirectoryResult<Option<DirectoryEntry>> {
            Ok(self.0.map(|dn| DirectoryEntry::new(dn, AttributeSet::new())))
        }
    }

    #[tokio::test]
    async fn test_all_attributes_are_retrieved_by_default() {
        let directory = directory();
        let auth = authenticator(&directory).build().unwrap();

        let user = auth.authenticate("bob", "bobspassword").await.unwrap();
        assert_eq!(user.username, "bob");
        assert_eq!(user.attributes.len(), 5);
        assert_eq!(user.location.as_str(), "uid=bob,ou=people");
    }

    #[tokio::test]
    async fn test_failed_search_gives_not_found() {
        let directory = directory();
        let auth = PasswordComparisonAuthenticator::builder(directory.clone());
        let auth = auth.user_search(Arc::new(FixedSearch(None))).build().unwrap();
        assert!(auth.user_dns("Bob").is_empty());

        let err = auth.authenticate("Joe", "password").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound { ref username } if username == "Joe"));

        // No read or compare was attempted
        assert_eq!(directory.context_count(), 0);
        assert_eq!(directory.read_count(), 0);
        assert_eq!(directory.compare_count(), 0);
    }

    #[tokio::test]
    async fn test_local_comparison_succeeds_with_sha_encoded_password() {
        let directory = directory();
        let auth = authenticator(&directory).build().unwrap();

        let user = auth.authenticate("ben", "benspassword").await.unwrap();
        assert_eq!(user.password(), Some(BENS_SHA));
        assert_eq!(directory.compare_count(), 0);
    }

    #[tokio::test]
    async fn test_local_comparison_fails_with_wrong_password() {
        let directory = directory();
        let auth = authenticator(&directory).build().unwrap();

        let err = auth.authenticate("Bob", "wrongpassword").await.unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
        assert_eq!(err.public_message(), "Authentication failed");
    }

    #[tokio::test]
    async fn test_directory_compare_fails_with_wrong_password() {
        let directory = directory();
        let auth = authenticator(&directory)
            .user_attributes(["uid", "cn", "sn"])
            .build()
            .unwrap();

        let err = auth.authenticate("Bob", "wrongpassword").await.unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
        assert_eq!(directory.compare_count(), 1);
    }

    #[tokio::test]
    async fn test_local_comparison_succeeds_with_correct_password() {
        let directory = directory();
        let auth = authenticator(&directory).build().unwrap();

        let user = auth.authenticate("bob", "bobspassword").await.unwrap();
        assert_eq!(user.username, "bob");
        assert_eq!(user.password(), Some("bobspassword"));
    }

    #[tokio::test]
    async fn test_multiple_dn_patterns() {
        let directory = directory();
        let auth = authenticator(&directory)
            .user_dn_patterns(["uid={0},ou=nonexistent", "uid={0},ou=people"])
            .build()
            .unwrap();

        let user = auth.authenticate("Bob", "bobspassword").await.unwrap();
        assert_eq!(user.location.as_str(), "uid=Bob,ou=people");
        assert_eq!(directory.read_count(), 2);
    }

    #[tokio::test]
    async fn test_mismatch_moves_on_to_next_pattern() {
        let directory = directory();
        let auth = authenticator(&directory)
            .user_dn_patterns(["uid={0},ou=otherpeople", "uid={0},ou=people"])
            .build()
            .unwrap();

        let user = auth.authenticate("bob", "bobspassword").await.unwrap();
        assert_eq!(user.location.as_str(), "uid=bob,ou=people");

        // First match wins, later patterns are not read
        let reads = directory.read_count();
        let user = auth.authenticate("bob", "otherbobspassword").await.unwrap();
        assert_eq!(user.location.as_str(), "uid=bob,ou=otherpeople");
        assert_eq!(directory.read_count(), reads + 1);
    }

    #[tokio::test]
    async fn test_only_specified_attributes_are_retrieved() {
        let directory = directory();
        let auth = authenticator(&directory)
            .user_attributes(["uid", "userPassword"])
            .password_encoder(plaintext())
            .unwrap()
            .build()
            .unwrap();

        let user = auth.authenticate("Bob", "bobspassword").await.unwrap();
        assert_eq!(user.attributes.len(), 2);
    }

    #[tokio::test]
    async fn test_directory_compare_succeeds_with_correct_password() {
        let directory = directory();
        let auth = authenticator(&directory)
            .user_attributes(["uid"])
            .password_encoder(plaintext())
            .unwrap()
            .build()
            .unwrap();

        let user = auth.authenticate("bob", "bobspassword").await.unwrap();
        assert_eq!(user.attributes.len(), 1);
        assert!(user.password().is_none());
        assert!(!user.attributes.contains("userPassword"));
        assert_eq!(directory.compare_count(), 1);
    }

    #[tokio::test]
    async fn test_directory_compare_succeeds_with_sha_encoded_password() {
        let directory = directory();
        let auth = authenticator(&directory).user_attributes(["uid"]).build().unwrap();

        let user = auth.authenticate("ben", "benspassword").await.unwrap();
        assert!(user.password().is_none());
        assert_eq!(directory.compare_count(), 1);
    }

    #[tokio::test]
    async fn test_directory_compare_never_exposes_password() {
        let directory = directory();
        // Mapper reads the password from an attribute that is returned
        let auth = authenticator(&directory)
            .user_attributes(["uid", "cn"])
            .password_encoder(plaintext())
            .unwrap()
            .identity_mapper(Arc::new(LdapIdentityMapper::new("cn")))
            .build()
            .unwrap();

        let user = auth.authenticate("bob", "bobspassword").await.unwrap();
        assert!(user.password().is_none());
    }

    #[test]
    fn test_password_encoder_cant_be_none() {
        let directory = directory();
        let result = authenticator(&directory).password_encoder(None);
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_use_of_different_password_attribute() {
        let directory = directory();
        let auth = authenticator(&directory)
            .password_attribute("uid")
            .identity_mapper(Arc::new(LdapIdentityMapper::new("uid")))
            .build()
            .unwrap();

        let user = auth.authenticate("bob", "bob").await.unwrap();
        assert_eq!(user.password(), Some("bob"));
    }

    #[tokio::test]
    async fn test_directory_compare_with_different_password_attribute() {
        let directory = directory();
        let auth = authenticator(&directory)
            .user_attributes(["uid"])
            .password_encoder(plaintext())
            .unwrap()
            .password_attribute("cn")
            .build()
            .unwrap();

        auth.authenticate("bob", "Bob Hamilton").await.unwrap();
        assert_eq!(directory.compare_count(), 1);
    }

    #[tokio::test]
    async fn test_with_user_search() {
        let directory = directory();
        let auth = PasswordComparisonAuthenticator::builder(directory.clone())
            .user_search(Arc::new(FixedSearch(Some(
                "uid=Bob,ou=people,dc=acegisecurity,dc=org",
            ))))
            .build()
            .unwrap();
        assert!(auth.user_dns("Bob").is_empty());

        let user = auth
            .authenticate("ShouldntBeUsed", "bobspassword")
            .await
            .unwrap();
        assert_eq!(user.username, "ShouldntBeUsed");
        assert_eq!(user.location.as_str(), "uid=Bob,ou=people,dc=acegisecurity,dc=org");
    }

    #[tokio::test]
    async fn test_multi_valued_password_attribute() {
        let directory = directory();
        directory.insert(
            "uid=dave,ou=people",
            attrs(&[("uid", &["dave"]), ("userPassword", &["oldpassword", BENS_SHA])]),
        );
        let auth = authenticator(&directory).build().unwrap();

        assert!(auth.authenticate("dave", "benspassword").await.is_ok());
        assert!(auth.authenticate("dave", "oldpassword").await.is_ok());
        assert!(auth.authenticate("dave", "newpassword").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_entry_everywhere_is_bad_credentials() {
        let directory = directory();
        let auth = authenticator(&directory).build().unwrap();

        let err = auth.authenticate("joe", "password").await.unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
    }

    #[test]
    fn test_build_requires_a_resolution_strategy() {
        let directory = directory();
        let result = PasswordComparisonAuthenticator::builder(directory).build();
        assert!(matches!(result, Err(AuthError::Configuration(_))));

        let directory = self::directory();
        let result = authenticator(&directory).password_attribute("").build();
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let directory = directory();
        let auth = authenticator(&directory).build().unwrap();

        directory.set_unavailable(true);
        let err = auth.authenticate("bob", "bobspassword").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::DirectoryUnavailable(DirectoryError::Connection(_))
        ));
        assert!(!err.is_authentication_failure());
    }

    #[tokio::test]
    async fn test_from_config_with_user_search() {
        let directory = directory();
        let config = AuthenticatorConfig {
            user_search: Some(UserSearchConfig {
                search_base: "ou=people".to_string(),
                ..Default::default()
            }),
            password_encoder: "plaintext".to_string(),
            ..Default::default()
        };

        let auth = PasswordComparisonAuthenticator::from_config(directory.clone(), &config).unwrap();
        assert!(auth.resolver().has_user_search());

        let user = auth.authenticate("Bob", "bobspassword").await.unwrap();
        assert_eq!(user.location.as_str(), "uid=bob,ou=people,dc=acegisecurity,dc=org");
        assert_eq!(directory.search_count(), 1);

        let err = auth.authenticate("joe", "password").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[test]
    fn test_from_config_rejects_invalid_configuration() {
        let directory = directory();

        let config = AuthenticatorConfig::default();
        assert!(matches!(
            PasswordComparisonAuthenticator::from_config(directory.clone(), &config),
            Err(AuthError::Configuration(_))
        ));

        let config = AuthenticatorConfig {
            user_dn_patterns: vec!["uid={0},ou=people".to_string()],
            password_encoder: "rot13".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            PasswordComparisonAuthenticator::from_config(directory, &config),
            Err(AuthError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_every_encoder_verifies_its_own_values() {
        let mut cases: Vec<(String, Arc<dyn PasswordEncoder>, String)> = Vec::new();
        for name in vouch_core::config::KNOWN_PASSWORD_ENCODERS {
            let encoder = encoder_for_name(name, false).unwrap();
            let stored = encoder.encode("secret");
            cases.push((name.to_string(), encoder, stored));
        }
        for digest in [LdapDigestPasswordEncoder::sha(), LdapDigestPasswordEncoder::md5()] {
            let stored = digest.encode_random_salted("secret");
            let encoder: Arc<dyn PasswordEncoder> = Arc::new(digest);
            cases.push((stored.clone(), encoder, stored));
        }
        let case_insensitive = encoder_for_name("plaintext", true).unwrap();
        cases.push(("plaintext, ignoring case".to_string(), case_insensitive, "SeCrEt".to_string()));

        for (label, encoder, stored) in cases {
            let directory = directory();
            directory.insert(
                "uid=dave,ou=people",
                attrs(&[("uid", &["dave"]), ("userPassword", &[stored.as_str()])]),
            );
            let auth = authenticator(&directory)
                .password_encoder(Some(encoder))
                .unwrap()
                .build()
                .unwrap();

            let user = auth.authenticate("dave", "secret").await;
            assert!(user.is_ok(), "{} should verify", label);
            assert_eq!(user.unwrap().username, "dave");
            assert!(
                matches!(auth.authenticate("dave", "wrong").await, Err(AuthError::BadCredentials)),
                "{} should reject a wrong password",
                label
            );
        }
    }

    #[tokio::test]
    async fn test_unsalted_encoders_verify_through_directory_compare() {
        for name in vouch_core::config::KNOWN_PASSWORD_ENCODERS {
            let encoder = encoder_for_name(name, false).unwrap();
            let directory = directory();
            directory.insert(
                "uid=dave,ou=people",
                attrs(&[("uid", &["dave"]), ("userPassword", &[encoder.encode("secret").as_str()])]),
            );
            let auth = authenticator(&directory)
                .user_attributes(["uid"])
                .password_encoder(Some(encoder))
                .unwrap()
                .build()
                .unwrap();

            let user = auth.authenticate("dave", "secret").await.unwrap();
            assert_eq!(user.username, "dave");
            assert!(user.password().is_none());
            assert_eq!(directory.compare_count(), 1, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_search_result_matching_a_pattern_is_tried_once() {
        let directory = directory();
        let config = AuthenticatorConfig {
            user_dn_patterns: vec!["uid={0},ou=people".to_string()],
            user_search: Some(UserSearchConfig {
                search_base: "ou=people".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let auth = PasswordComparisonAuthenticator::from_config(directory.clone(), &config).unwrap();

        let candidates = auth.resolver().resolve("bob").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].as_str(), "uid=bob,ou=people");

        let err = auth.authenticate("bob", "wrongpassword").await.unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
        assert_eq!(directory.read_count(), 1);
    }

    #[tokio::test]
    async fn test_compare_on_entry_without_password_moves_on() {
        let directory = directory();
        directory.insert("uid=bob,ou=contacts", attrs(&[("uid", &["bob"])]));
        let auth = authenticator(&directory)
            .user_dn_patterns(["uid={0},ou=contacts", "uid={0},ou=people"])
            .user_attributes(["uid"])
            .password_encoder(plaintext())
            .unwrap()
            .build()
            .unwrap();

        let user = auth.authenticate("bob", "bobspassword").await.unwrap();
        assert_eq!(user.location.as_str(), "uid=bob,ou=people");
        assert_eq!(directory.compare_count(), 2);
    }

    #[tokio::test]
    async fn test_credentials_can_be_erased_after_local_comparison() {
        let directory = directory();
        let auth = authenticator(&directory)
            .erase_credentials_after_authentication(true)
            .build()
            .unwrap();

        let user = auth.authenticate("bob", "bobspassword").await.unwrap();
        assert!(user.password().is_none());
        assert_eq!(user.attributes.len(), 5);
        assert_eq!(directory.compare_count(), 0);

        let config = AuthenticatorConfig {
            user_dn_patterns: vec!["uid={0},ou=people".to_string()],
            erase_credentials: true,
            ..Default::default()
        };
        let auth = PasswordComparisonAuthenticator::from_config(directory, &config).unwrap();
        let user = auth.authenticate("ben", "benspassword").await.unwrap();
        assert!(user.password().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_authentications() {
        let directory = directory();
        let auth = Arc::new(authenticator(&directory).build().unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let auth = auth.clone();
            handles.push(tokio::spawn(async move {
                let password = if i % 2 == 0 { "bobspassword" } else { "wrongpassword" };
                (i, auth.authenticate("bob", password).await)
            }));
        }

        for handle in handles {
            let (i, result) = handle.await.unwrap();
            if i % 2 == 0 {
                assert!(result.is_ok());
            } else {
                assert!(matches!(result, Err(AuthError::BadCredentials)));
            }
        }
        assert_eq!(directory.context_count(), 16);
    }
}
