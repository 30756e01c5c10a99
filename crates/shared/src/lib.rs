//! Shared utilities and common types for the Progame backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Keyed digests for signed identities (BLAKE2b)
//! - Random token generation (link hashes, codes, passwords, attempt ids)
//! - Syntactic payload validation

pub mod crypto;
pub mod random;
pub mod validation;
