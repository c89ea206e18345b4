//! Shared success envelope for API handlers.
//!
//! Every successful body is `{ "msg": ..., "data": ... }`.

use axum::Json;
use serde::Serialize;

/// Standard `{ "msg": String, "data": T }` envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub msg: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data` in the envelope, ready to return from a handler.
    pub fn new(msg: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            msg: msg.into(),
            data,
        })
    }
}
