//! Password encoders for directory-stored credentials
//!
//! Supports the RFC 2307 style schemes found in `userPassword` values:
//! - `{SHA}` / `{SSHA}` (salted SHA-1)
//! - `{MD5}` / `{SMD5}` (salted MD5)
//! - plaintext values without a scheme prefix

use crate::hash::{constant_time_eq, md5_digest, random_salt, sha1_digest, DEFAULT_SALT_LEN};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::warn;

/// Encodes raw passwords and checks raw passwords against stored values.
pub trait PasswordEncoder: Send + Sync {
    /// Deterministic encoding of `raw`. This is also the value handed to a
    /// directory compare operation.
    fn encode(&self, raw: &str) -> String;

    /// Whether `raw` matches the stored `encoded` value
    fn matches(&self, raw: &str, encoded: &str) -> bool;
}

/// Look up an encoder by its configuration name.
///
/// Returns `None` for unknown or empty names.
pub fn encoder_for_name(name: &str, ignore_password_case: bool) -> Option<Arc<dyn PasswordEncoder>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "plaintext" => Some(Arc::new(PlaintextPasswordEncoder::new(ignore_password_case))),
        "sha" => Some(Arc::new(LdapDigestPasswordEncoder::sha())),
        "md5" => Some(Arc::new(LdapDigestPasswordEncoder::md5())),
        _ => None,
    }
}

// ============================================================================
// Plaintext
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PlaintextPasswordEncoder {
    ignore_password_case: bool,
}

impl PlaintextPasswordEncoder {
    pub fn new(ignore_password_case: bool) -> Self {
        Self {
            ignore_password_case,
        }
    }
}

impl PasswordEncoder for PlaintextPasswordEncoder {
    fn encode(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        if self.ignore_password_case {
            let raw = raw.to_lowercase();
            let encoded = encoded.to_lowercase();
            constant_time_eq(raw.as_bytes(), encoded.as_bytes())
        } else {
            constant_time_eq(raw.as_bytes(), encoded.as_bytes())
        }
    }
}

// ============================================================================
// LDAP digest schemes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Md5,
}

impl DigestAlgorithm {
    fn digest_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Md5 => 16,
        }
    }

    fn digest(self, raw: &[u8], salt: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => sha1_digest(&[raw, salt]),
            DigestAlgorithm::Md5 => md5_digest(&[raw, salt]),
        }
    }

    fn prefix(self, salted: bool) -> &'static str {
        match (self, salted) {
            (DigestAlgorithm::Sha1, false) => "{SHA}",
            (DigestAlgorithm::Sha1, true) => "{SSHA}",
            (DigestAlgorithm::Md5, false) => "{MD5}",
            (DigestAlgorithm::Md5, true) => "{SMD5}",
        }
    }

    /// Scheme name inside the braces, matched case-insensitively
    fn from_scheme(scheme: &str) -> Option<(Self, bool)> {
        match scheme.to_ascii_uppercase().as_str() {
            "SHA" => Some((DigestAlgorithm::Sha1, false)),
            "SSHA" => Some((DigestAlgorithm::Sha1, true)),
            "MD5" => Some((DigestAlgorithm::Md5, false)),
            "SMD5" => Some((DigestAlgorithm::Md5, true)),
            _ => None,
        }
    }
}

/// Encoder for `{SHA}`, `{SSHA}`, `{MD5}` and `{SMD5}` values.
///
/// The algorithm only selects the scheme produced by `encode`; `matches`
/// accepts any of the supported schemes.
#[derive(Debug, Clone)]
pub struct LdapDigestPasswordEncoder {
    algorithm: DigestAlgorithm,
    force_lower_case_prefix: bool,
}

impl LdapDigestPasswordEncoder {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            force_lower_case_prefix: false,
        }
    }

    pub fn sha() -> Self {
        Self::new(DigestAlgorithm::Sha1)
    }

    pub fn md5() -> Self {
        Self::new(DigestAlgorithm::Md5)
    }

    /// Render prefixes as `{sha}` instead of `{SHA}`
    pub fn with_lower_case_prefix(mut self, force: bool) -> Self {
        self.force_lower_case_prefix = force;
        self
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn encode_salted(&self, raw: &str, salt: &[u8]) -> String {
        if salt.is_empty() {
            return self.encode(raw);
        }

        let mut bytes = self.algorithm.digest(raw.as_bytes(), salt);
        bytes.extend_from_slice(salt);
        format!("{}{}", self.prefix(true), STANDARD.encode(bytes))
    }

    pub fn encode_random_salted(&self, raw: &str) -> String {
        self.encode_salted(raw, &random_salt(DEFAULT_SALT_LEN))
    }

    fn prefix(&self, salted: bool) -> String {
        let prefix = self.algorithm.prefix(salted);
        if self.force_lower_case_prefix {
            prefix.to_ascii_lowercase()
        } else {
            prefix.to_string()
        }
    }
}

impl Default for LdapDigestPasswordEncoder {
    fn default() -> Self {
        Self::sha()
    }
}

impl PasswordEncoder for LdapDigestPasswordEncoder {
    fn encode(&self, raw: &str) -> String {
        let digest = self.algorithm.digest(raw.as_bytes(), &[]);
        format!("{}{}", self.prefix(false), STANDARD.encode(digest))
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        let Some((scheme, payload)) = split_scheme(encoded) else {
            return constant_time_eq(raw.as_bytes(), encoded.as_bytes());
        };

        let Some((algorithm, salted)) = DigestAlgorithm::from_scheme(scheme) else {
            warn!("Unsupported password scheme: {{{}}}", scheme);
            return false;
        };

        let Ok(decoded) = STANDARD.decode(payload.trim()) else {
            return false;
        };

        let digest_len = algorithm.digest_len();
        if decoded.len() < digest_len || (!salted && decoded.len() != digest_len) {
            return false;
        }

        let (stored_digest, salt) = decoded.split_at(digest_len);
        let candidate = algorithm.digest(raw.as_bytes(), salt);
        constant_time_eq(&candidate, stored_digest)
    }
}

/// Split `{SCHEME}payload` into its parts
fn split_scheme(encoded: &str) -> Option<(&str, &str)> {
    let rest = encoded.strip_prefix('{')?;
    let end = rest.find('}')?;
    Some((&rest[..end], &rest[end + 1..]))
}
