//! Authentication primitives.
//!
//! - [`password`] -- Argon2id hashing and temporary password generation.
//! - [`jwt`] -- bearer-token generation and validation.

pub mod jwt;
pub mod password;
