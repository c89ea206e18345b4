//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated caller, from a Bearer token.
//! - [`request_meta`] -- client address and user agent of a request.

pub mod auth;
pub mod request_meta;
