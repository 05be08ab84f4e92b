//! Decryption gateway.
//!
//! Decrypts encrypted assertions, identifiers and attributes when a
//! decrypter is configured. Per-item failures are logged and skipped so a
//! single malformed encrypted item cannot poison an otherwise valid
//! response.

use thiserror::Error;

use crate::types::{
    Assertion, Attribute, EncryptedAssertion, EncryptedAttribute, EncryptedId, NameId, Response,
};

/// Error raised by a [`Decrypter`] implementation.
#[derive(Debug, Error)]
#[error("decryption failed: {0}")]
pub struct DecryptionError(
    /// Reason the payload could not be decrypted.
    pub String,
);

/// Decrypts encrypted SAML content.
///
/// Implementations hold the service provider's decryption key material.
/// They must be thread-safe; the validator may call them concurrently from
/// independent requests.
pub trait Decrypter: Send + Sync {
    /// Decrypts an encrypted assertion.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] when the payload cannot be decrypted.
    fn decrypt_assertion(&self, encrypted: &EncryptedAssertion)
        -> Result<Assertion, DecryptionError>;

    /// Decrypts an encrypted identifier into a name ID.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] when the payload cannot be decrypted.
    fn decrypt_name_id(&self, encrypted: &EncryptedId) -> Result<NameId, DecryptionError>;

    /// Decrypts an individually encrypted attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] when the payload cannot be decrypted.
    fn decrypt_attribute(&self, encrypted: &EncryptedAttribute)
        -> Result<Attribute, DecryptionError>;
}

/// Builds the combined assertion view of a response.
///
/// Cleartext assertions come first, followed by every encrypted assertion
/// the decrypter could open, in document order. The response itself is left
/// untouched. Without a decrypter, encrypted assertions are reported and
/// skipped.
#[must_use]
pub fn decrypted_assertions(
    response: &Response,
    decrypter: Option<&dyn Decrypter>,
) -> Vec<Assertion> {
    let mut assertions = response.assertions.clone();

    if response.encrypted_assertions.is_empty() {
        return assertions;
    }

    let Some(decrypter) = decrypter else {
        tracing::warn!(
            count = response.encrypted_assertions.len(),
            "encrypted assertions returned but no decrypter is configured"
        );
        return assertions;
    };

    for encrypted in &response.encrypted_assertions {
        match decrypter.decrypt_assertion(encrypted) {
            Ok(assertion) => assertions.push(assertion),
            Err(e) => {
                tracing::warn!("decryption of assertion failed, continuing with the next one: {e}");
            }
        }
    }

    assertions
}

/// Decrypts an encrypted identifier, if present and decryptable.
///
/// Returns `None` when the identifier is absent, no decrypter is
/// configured, or decryption fails; failures never abort validation.
#[must_use]
pub fn decrypt_id(
    encrypted: Option<&EncryptedId>,
    decrypter: Option<&dyn Decrypter>,
) -> Option<NameId> {
    let encrypted = encrypted?;
    let Some(decrypter) = decrypter else {
        tracing::warn!("encrypted identifier present but no decrypter is configured");
        return None;
    };
    match decrypter.decrypt_name_id(encrypted) {
        Ok(name_id) => Some(name_id),
        Err(e) => {
            tracing::warn!("decryption of identifier failed: {e}");
            None
        }
    }
}

/// Decrypts the encrypted attributes of one statement.
///
/// Failed items are skipped with a warning.
#[must_use]
pub fn decrypt_attributes(
    encrypted: &[EncryptedAttribute],
    decrypter: Option<&dyn Decrypter>,
) -> Vec<Attribute> {
    if encrypted.is_empty() {
        return Vec::new();
    }

    let Some(decrypter) = decrypter else {
        tracing::warn!("encrypted attributes returned but no decrypter is configured");
        return Vec::new();
    };

    let mut attributes = Vec::new();
    for item in encrypted {
        match decrypter.decrypt_attribute(item) {
            Ok(attribute) => attributes.push(attribute),
            Err(e) => {
                tracing::warn!("decryption of attribute failed, continuing with the next one: {e}");
            }
        }
    }
    attributes
}
