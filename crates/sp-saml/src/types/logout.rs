//! SAML Logout request type.
//!
//! The service provider stores outgoing `LogoutRequest` messages alongside
//! `AuthnRequest`s in the sent-message store; only its recording side is
//! handled here, logout processing itself lives outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NameId;

/// SAML Logout Request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Version of the SAML protocol.
    #[serde(default = "default_version")]
    pub version: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the requester.
    pub issuer: String,

    /// The name identifier of the principal to log out.
    pub name_id: NameId,

    /// Session indexes to terminate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_indexes: Vec<String>,
}

fn default_version() -> String {
    super::SAML_VERSION_20.to_string()
}

impl LogoutRequest {
    /// Creates a new logout request.
    #[must_use]
    pub fn new(issuer: impl Into<String>, name_id: NameId) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            version: super::SAML_VERSION_20.to_string(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            name_id,
            session_indexes: Vec::new(),
        }
    }

    /// Adds a session index to terminate.
    #[must_use]
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_indexes.push(index.into());
        self
    }
}
