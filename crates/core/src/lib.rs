//! Domain vocabulary for the client project portal.
//!
//! Everything here is free of I/O so it can be shared by the database,
//! event and HTTP layers and unit-tested in isolation.

#[macro_use]
mod macros;

pub mod actions;
pub mod activity;
pub mod comment;
pub mod credential;
pub mod crypto;
pub mod deliverable;
pub mod error;
pub mod meeting;
pub mod milestone;
pub mod notification;
pub mod ordering;
pub mod policy;
pub mod project;
pub mod roles;
pub mod types;
