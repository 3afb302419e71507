//! CLI command implementations

pub mod authenticate;
pub mod check;
pub mod encode;
