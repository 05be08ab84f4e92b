//! SAML Response types.
//!
//! The response message an identity provider sends back to the service
//! provider's assertion consumer endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signature::XmlSignature;

use super::{Assertion, Issuer, Status};

/// SAML Response.
///
/// Carries the authentication result for a prior `AuthnRequest`. This is
/// the parsed form handed over by the XML binding layer; the validator in
/// this crate decides whether it is acceptable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier for this response.
    pub id: String,

    /// Version of the SAML protocol.
    #[serde(default = "default_version")]
    pub version: String,

    /// Timestamp when this response was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity that issued this response, when stated on the envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    /// The ID of the request this response answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// The URL the identity provider addressed this response to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The status of the response.
    pub status: Status,

    /// Signature over the response envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<XmlSignature>,

    /// The cleartext assertions in this response, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertions: Vec<Assertion>,

    /// Encrypted assertions in this response, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_assertions: Vec<EncryptedAssertion>,
}

fn default_version() -> String {
    super::SAML_VERSION_20.to_string()
}

impl Response {
    /// Creates a new success response from the given issuer.
    #[must_use]
    pub fn success(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            version: super::SAML_VERSION_20.to_string(),
            issue_instant: Utc::now(),
            issuer: Some(Issuer::new(issuer)),
            in_response_to: None,
            destination: None,
            status: Status::success(),
            signature: None,
            assertions: Vec::new(),
            encrypted_assertions: Vec::new(),
        }
    }

    /// Creates a new response with an explicit status.
    #[must_use]
    pub fn with_status(issuer: impl Into<String>, status: Status) -> Self {
        Self {
            status,
            ..Self::success(issuer)
        }
    }

    /// Sets the request ID this response answers.
    #[must_use]
    pub fn in_response_to(mut self, request_id: impl Into<String>) -> Self {
        self.in_response_to = Some(request_id.into());
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Sets the envelope signature.
    #[must_use]
    pub fn with_signature(mut self, signature: XmlSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Adds an assertion to this response.
    #[must_use]
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Adds an encrypted assertion to this response.
    #[must_use]
    pub fn with_encrypted_assertion(mut self, assertion: EncryptedAssertion) -> Self {
        self.encrypted_assertions.push(assertion);
        self
    }

    /// Returns true if this response denotes success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Encrypted assertion.
///
/// Holds the encrypted octets of an assertion; a configured decrypter turns
/// it back into an [`Assertion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedAssertion {
    /// The encrypted payload.
    pub encrypted_data: EncryptedData,
}

/// Encrypted data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The encryption algorithm URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<String>,

    /// Key material reference for decryption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_info: Option<KeyInfo>,

    /// The cipher value (base64 encoded).
    pub cipher_value: String,
}

impl EncryptedData {
    /// Creates encrypted data from a cipher value.
    #[must_use]
    pub fn new(cipher_value: impl Into<String>) -> Self {
        Self {
            encryption_method: None,
            key_info: None,
            cipher_value: cipher_value.into(),
        }
    }
}

/// Key information accompanying encrypted data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyInfo {
    /// An encrypted session key (base64 encoded), when key transport is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,

    /// A key name hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_builders() {
        let response = Response::success("https://idp.example/entity")
            .in_response_to("_req123")
            .with_destination("https://sp.example/acs");

        assert!(response.is_success());
        assert!(!response.id.is_empty());
        assert_eq!(response.in_response_to.as_deref(), Some("_req123"));
        assert_eq!(
            response.issuer.as_ref().map(|i| i.value.as_str()),
            Some("https://idp.example/entity")
        );
    }

    #[test]
    fn response_with_error_status() {
        let response =
            Response::with_status("https://idp.example/entity", Status::authn_failed("denied"));

        assert!(!response.is_success());
        assert!(response.assertions.is_empty());
    }
}
