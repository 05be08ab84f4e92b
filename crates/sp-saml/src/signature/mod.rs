//! XML signature support for inbound SAML messages.
//!
//! A service provider never canonicalizes XML itself; the binding layer
//! hands over the canonical octets each signature covers together with the
//! signature value and optional embedded certificate. This module models
//! that digest form and the trust engines that verify it.
//!
//! Supported signature algorithms:
//! - RSA-SHA256
//! - RSA-SHA384
//! - RSA-SHA512
//!
//! Legacy RSA-SHA1 signatures are recognized but always rejected at
//! verification time.

mod trust;

pub use trust::*;

use serde::{Deserialize, Serialize};

use crate::types::signature_algorithms;

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (SAML interop baseline).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// Legacy RSA with SHA-1 (rejected at verification).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }
}

/// XML signature in digest form.
///
/// Represents a `<ds:Signature>` element after the XML layer has resolved
/// references and canonicalized the covered content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmlSignature {
    /// The signature algorithm used.
    pub algorithm: SignatureAlgorithm,

    /// The canonical octets the signature covers.
    pub signed_content: Vec<u8>,

    /// The signature value (base64 encoded).
    pub signature_value: String,

    /// Optional embedded X.509 certificate (base64 encoded DER).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x509_certificate: Option<String>,
}

impl XmlSignature {
    /// Creates a signature over the given content.
    #[must_use]
    pub fn new(
        algorithm: SignatureAlgorithm,
        signed_content: impl Into<Vec<u8>>,
        signature_value: impl Into<String>,
    ) -> Self {
        Self {
            algorithm,
            signed_content: signed_content.into(),
            signature_value: signature_value.into(),
            x509_certificate: None,
        }
    }

    /// Attaches an embedded certificate (base64 encoded DER).
    #[must_use]
    pub fn with_certificate(mut self, certificate: impl Into<String>) -> Self {
        self.x509_certificate = Some(certificate.into());
        self
    }
}
