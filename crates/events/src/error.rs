use portal_core::error::CoreError;

use crate::delivery::email::EmailError;

/// Failure inside a subscriber or one of its stores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Email(#[from] EmailError),

    /// A subscriber panicked while handling an event.
    #[error("Subscriber panicked: {0}")]
    Panicked(String),
}
