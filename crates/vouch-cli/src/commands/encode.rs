//! `encode-password` command

use clap::ValueEnum;
use vouch_crypto::{LdapDigestPasswordEncoder, PasswordEncoder, PlaintextPasswordEncoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    Plaintext,
    Sha,
    Ssha,
    Md5,
    Smd5,
}

pub fn encode(scheme: Scheme, password: &str) -> String {
    match scheme {
        Scheme::Plaintext => PlaintextPasswordEncoder::default().encode(password),
        Scheme::Sha => LdapDigestPasswordEncoder::sha().encode(password),
        Scheme::Ssha => LdapDigestPasswordEncoder::sha().encode_random_salted(password),
        Scheme::Md5 => LdapDigestPasswordEncoder::md5().encode(password),
        Scheme::Smd5 => LdapDigestPasswordEncoder::md5().encode_random_salted(password),
    }
}
