//! Credential entity model and DTOs.
//!
//! The encrypted secret is loaded with the row but never serialized.

use portal_core::credential::CredentialType;
use portal_core::types::{CredentialId, EntityRef, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A credential row from the `credentials` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Credential {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: CredentialType,
    pub username: Option<String>,
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub encrypted_secret: Vec<u8>,
    pub notes: Option<String>,
    pub metadata: serde_json::Value,
    pub last_accessed_at: Option<Timestamp>,
    pub created_by: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Credential {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Credential(CredentialId(self.id))
    }
}

/// Request body for creating a credential; `secret` is plaintext.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCredentialRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CredentialType,
    pub username: Option<String>,
    pub url: Option<String>,
    #[validate(length(min = 1))]
    pub secret: String,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Request body for updating a credential. An empty `secret` keeps the
/// stored one.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCredentialRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CredentialType>,
    pub username: Option<String>,
    pub url: Option<String>,
    pub secret: Option<String>,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Insert DTO with the secret already encrypted.
#[derive(Debug, Clone)]
pub struct CreateCredential {
    pub project_id: Uuid,
    pub name: String,
    pub kind: CredentialType,
    pub username: Option<String>,
    pub url: Option<String>,
    pub encrypted_secret: Vec<u8>,
    pub notes: Option<String>,
    pub metadata: serde_json::Value,
    pub created_by: Option<Uuid>,
}

/// Update DTO with the secret already encrypted, if it changes.
#[derive(Debug, Clone, Default)]
pub struct UpdateCredential {
    pub name: Option<String>,
    pub kind: Option<CredentialType>,
    pub username: Option<String>,
    pub url: Option<String>,
    pub encrypted_secret: Option<Vec<u8>>,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// The decrypted secret returned by a reveal.
#[derive(Debug, Clone, Serialize)]
pub struct RevealedSecret {
    pub secret: String,
    pub accessed_at: Timestamp,
}
