//! Cryptography utilities for Vouch

pub mod encoding;
pub mod hash;

pub use encoding::*;
pub use hash::*;
