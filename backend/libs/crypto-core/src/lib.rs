//! Shared cryptographic helpers: RS256 session tokens and SHA-256 fingerprints.
pub mod hash;
pub mod jwt;
