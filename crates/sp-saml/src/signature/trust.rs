//! Signature trust engines.
//!
//! A trust engine verifies an [`XmlSignature`] against the trust material
//! configured for a named peer entity. Engines are reusable and thread-safe;
//! a provider hands the validator one engine per validation call.

use std::collections::HashMap;
use std::sync::Arc;

use aws_lc_rs::signature::{
    UnparsedPublicKey, VerificationAlgorithm, RSA_PKCS1_2048_8192_SHA256,
    RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
};
use base64::Engine;

use crate::error::ValidationError;

use super::{SignatureAlgorithm, XmlSignature};

/// Verifier over XML signatures given peer trust material.
pub trait SignatureTrustEngine: Send + Sync {
    /// Verifies a signature for the given peer entity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SignatureValidation`] when the signature
    /// does not validate against the peer's configured trust material.
    fn verify(&self, signature: &XmlSignature, peer_entity_id: &str)
        -> Result<(), ValidationError>;
}

/// Builds a signature trust engine per validation call.
pub trait SignatureTrustEngineProvider: Send + Sync {
    /// Returns a ready-to-use trust engine.
    fn build(&self) -> Arc<dyn SignatureTrustEngine>;
}

/// Verifies a signature when one is present; no-op otherwise.
///
/// Callers enforce mandatoriness separately.
pub fn verify_if_present(
    signature: Option<&XmlSignature>,
    peer_entity_id: &str,
    engine: &dyn SignatureTrustEngine,
) -> Result<(), ValidationError> {
    match signature {
        Some(signature) => engine.verify(signature, peer_entity_id),
        None => Ok(()),
    }
}

/// Trust material registered for one peer entity.
#[derive(Debug, Clone)]
struct TrustedKey {
    /// Public key, DER encoded (SubjectPublicKeyInfo).
    public_key: Vec<u8>,
    /// Originating certificate, DER encoded, when registered from one.
    certificate: Option<Vec<u8>>,
}

/// Trust engine backed by per-entity X.509 trust material.
///
/// Certificates typically come from the peer's metadata. An embedded
/// certificate on a signature is never trusted on its own; verification
/// only ever uses registered material.
#[derive(Debug, Default)]
pub struct X509TrustEngine {
    trusted: HashMap<String, Vec<TrustedKey>>,
}

impl X509TrustEngine {
    /// Creates an engine with no trust material.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a trusted certificate (DER) for an entity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SignatureValidation`] when the certificate
    /// cannot be parsed.
    pub fn add_certificate(
        &mut self,
        entity_id: impl Into<String>,
        certificate_der: Vec<u8>,
    ) -> Result<(), ValidationError> {
        let public_key = extract_public_key(&certificate_der)?;
        self.trusted.entry(entity_id.into()).or_default().push(TrustedKey {
            public_key,
            certificate: Some(certificate_der),
        });
        Ok(())
    }

    /// Registers a trusted public key (DER SubjectPublicKeyInfo) for an entity.
    pub fn add_public_key(&mut self, entity_id: impl Into<String>, public_key_der: Vec<u8>) {
        self.trusted.entry(entity_id.into()).or_default().push(TrustedKey {
            public_key: public_key_der,
            certificate: None,
        });
    }

    fn candidate_keys(
        &self,
        signature: &XmlSignature,
        entity_id: &str,
    ) -> Result<Vec<&TrustedKey>, ValidationError> {
        let keys = self.trusted.get(entity_id).ok_or_else(|| {
            ValidationError::SignatureValidation(format!(
                "no trust material registered for entity {entity_id}"
            ))
        })?;

        // An embedded certificate narrows the candidates when it matches a
        // registered one; an unknown embedded certificate is ignored.
        if let Some(embedded_b64) = &signature.x509_certificate {
            if let Ok(embedded) = base64::engine::general_purpose::STANDARD.decode(embedded_b64) {
                let matching: Vec<&TrustedKey> = keys
                    .iter()
                    .filter(|k| k.certificate.as_deref() == Some(embedded.as_slice()))
                    .collect();
                if !matching.is_empty() {
                    return Ok(matching);
                }
            }
        }

        Ok(keys.iter().collect())
    }
}

impl SignatureTrustEngine for X509TrustEngine {
    fn verify(
        &self,
        signature: &XmlSignature,
        peer_entity_id: &str,
    ) -> Result<(), ValidationError> {
        let verification_alg: &dyn VerificationAlgorithm = match signature.algorithm {
            SignatureAlgorithm::RsaSha256 => &RSA_PKCS1_2048_8192_SHA256,
            SignatureAlgorithm::RsaSha384 => &RSA_PKCS1_2048_8192_SHA384,
            SignatureAlgorithm::RsaSha512 => &RSA_PKCS1_2048_8192_SHA512,
            SignatureAlgorithm::RsaSha1 => {
                return Err(ValidationError::SignatureValidation(
                    "SHA-1 signatures are not allowed".to_string(),
                ));
            }
        };

        let signature_bytes = base64::engine::general_purpose::STANDARD
            .decode(&signature.signature_value)
            .map_err(|e| {
                ValidationError::SignatureValidation(format!("invalid signature encoding: {e}"))
            })?;

        for key in self.candidate_keys(signature, peer_entity_id)? {
            let public_key = UnparsedPublicKey::new(verification_alg, &key.public_key);
            if public_key
                .verify(&signature.signed_content, &signature_bytes)
                .is_ok()
            {
                return Ok(());
            }
        }

        Err(ValidationError::SignatureValidation(format!(
            "signature verification failed with all trusted credentials for {peer_entity_id}"
        )))
    }
}

/// Provider that always hands out the same pre-built engine.
#[derive(Clone)]
pub struct StaticTrustEngineProvider {
    engine: Arc<dyn SignatureTrustEngine>,
}

impl StaticTrustEngineProvider {
    /// Wraps an engine for shared use.
    #[must_use]
    pub fn new(engine: impl SignatureTrustEngine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

impl SignatureTrustEngineProvider for StaticTrustEngineProvider {
    fn build(&self) -> Arc<dyn SignatureTrustEngine> {
        Arc::clone(&self.engine)
    }
}

/// Extracts the SubjectPublicKeyInfo from a DER certificate.
fn extract_public_key(certificate_der: &[u8]) -> Result<Vec<u8>, ValidationError> {
    use x509_parser::prelude::*;

    let (_, certificate) = X509Certificate::from_der(certificate_der).map_err(|e| {
        ValidationError::SignatureValidation(format!("failed to parse certificate: {e}"))
    })?;

    Ok(certificate.public_key().raw.to_vec())
}

#[cfg(test)]
mod tests {
    use aws_lc_rs::rand::SystemRandom;
    use aws_lc_rs::rsa::KeySize;
    use aws_lc_rs::signature::{KeyPair, RsaKeyPair, RSA_PKCS1_SHA256};

    use super::*;

    const IDP: &str = "https://idp.example/entity";

    fn signing_key() -> RsaKeyPair {
        RsaKeyPair::generate(KeySize::Rsa2048).expect("generate RSA key")
    }

    fn sign(key_pair: &RsaKeyPair, content: &[u8]) -> XmlSignature {
        let mut signature = vec![0u8; key_pair.public_modulus_len()];
        key_pair
            .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), content, &mut signature)
            .expect("sign content");
        XmlSignature::new(
            SignatureAlgorithm::RsaSha256,
            content,
            base64::engine::general_purpose::STANDARD.encode(signature),
        )
    }

    fn engine_trusting(key_pair: &RsaKeyPair) -> X509TrustEngine {
        let mut engine = X509TrustEngine::new();
        engine.add_public_key(IDP, key_pair.public_key().as_ref().to_vec());
        engine
    }

    #[test]
    fn valid_signature_verifies() {
        let key_pair = signing_key();
        let engine = engine_trusting(&key_pair);
        let signature = sign(&key_pair, b"signed payload");

        assert!(engine.verify(&signature, IDP).is_ok());
    }

    #[test]
    fn tampered_content_is_rejected() {
        let key_pair = signing_key();
        let engine = engine_trusting(&key_pair);
        let mut signature = sign(&key_pair, b"signed payload");
        signature.signed_content[0] ^= 0x01;

        assert!(matches!(
            engine.verify(&signature, IDP),
            Err(ValidationError::SignatureValidation(_))
        ));
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let key_pair = signing_key();
        let engine = engine_trusting(&key_pair);
        let signature = sign(&key_pair, b"signed payload");

        assert!(engine.verify(&signature, "https://other.example/entity").is_err());
    }

    #[test]
    fn untrusted_key_is_rejected() {
        let key_pair = signing_key();
        let engine = engine_trusting(&key_pair);
        let rogue = signing_key();
        let signature = sign(&rogue, b"signed payload");

        assert!(engine.verify(&signature, IDP).is_err());
    }

    #[test]
    fn sha1_signatures_are_rejected() {
        let key_pair = signing_key();
        let engine = engine_trusting(&key_pair);
        let mut signature = sign(&key_pair, b"signed payload");
        signature.algorithm = SignatureAlgorithm::RsaSha1;

        assert!(matches!(
            engine.verify(&signature, IDP),
            Err(ValidationError::SignatureValidation(_))
        ));
    }

    #[test]
    fn absent_signature_is_a_noop() {
        let key_pair = signing_key();
        let engine = engine_trusting(&key_pair);
        assert!(verify_if_present(None, IDP, &engine).is_ok());
    }
}
