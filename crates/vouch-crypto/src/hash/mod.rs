//! Hash utilities

use digest::Digest;
use md5::Md5;
use rand::Rng;
use sha1::Sha1;
use subtle::ConstantTimeEq;

/// Length of the salt generated for `{SSHA}` / `{SMD5}` values
pub const DEFAULT_SALT_LEN: usize = 8;

pub fn sha1_digest(parts: &[&[u8]]) -> Vec<u8> {
    digest_parts::<Sha1>(parts)
}

pub fn md5_digest(parts: &[&[u8]]) -> Vec<u8> {
    digest_parts::<Md5>(parts)
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

pub fn random_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rand::rng().fill(&mut salt[..]);
    salt
}

/// Constant-time comparison of two byte slices.
///
/// Only the length check short-circuits.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).into()
}
