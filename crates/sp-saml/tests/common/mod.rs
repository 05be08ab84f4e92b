//! Shared harness for response validation tests.
//!
//! Plays a minimal identity provider: an RSA signing key registered as
//! trust material, a sent authentication request, and builders for
//! freshly minted responses the way a real IdP would shape them.

#![allow(dead_code)]

use std::sync::Arc;

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::rsa::KeySize;
use aws_lc_rs::signature::{KeyPair, RsaKeyPair, RSA_PKCS1_SHA256};
use base64::Engine;
use chrono::{Duration, Utc};

use sp_cache::InMemoryReplayCache;
use sp_saml::config::SpConfiguration;
use sp_saml::context::{AcsEndpoint, MessageContext};
use sp_saml::decryption::{Decrypter, DecryptionError};
use sp_saml::signature::{SignatureAlgorithm, StaticTrustEngineProvider, X509TrustEngine, XmlSignature};
use sp_saml::store::{InMemorySentMessageStore, RecordingLogoutHandler, SentMessageStore};
use sp_saml::types::{
    Assertion, Attribute, AttributeStatement, AuthnContextClass, AuthnRequest, AuthnStatement,
    Conditions, EncryptedAssertion, EncryptedData, EncryptedId, NameId, Response, Subject,
    SubjectConfirmation, SubjectConfirmationData,
};
use sp_saml::AuthnResponseValidator;

pub const IDP_ENTITY_ID: &str = "https://idp.example/entity";
pub const SP_ENTITY_ID: &str = "https://sp.example/entity";
pub const ACS_URL: &str = "https://sp.example/acs";

/// A minimal identity provider with one signing key.
pub struct TestIdp {
    key_pair: RsaKeyPair,
}

impl TestIdp {
    pub fn new() -> Self {
        Self {
            key_pair: RsaKeyPair::generate(KeySize::Rsa2048).expect("generate RSA key"),
        }
    }

    /// Signs canonical content the way the XML layer would present it.
    pub fn sign(&self, content: &[u8]) -> XmlSignature {
        let mut signature = vec![0u8; self.key_pair.public_modulus_len()];
        self.key_pair
            .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), content, &mut signature)
            .expect("sign content");
        XmlSignature::new(
            SignatureAlgorithm::RsaSha256,
            content,
            base64::engine::general_purpose::STANDARD.encode(signature),
        )
    }

    /// A trust engine that trusts this IdP's key.
    pub fn trust_engine(&self) -> X509TrustEngine {
        let mut engine = X509TrustEngine::new();
        engine.add_public_key(IDP_ENTITY_ID, self.key_pair.public_key().as_ref().to_vec());
        engine
    }
}

/// One SP-side validation environment with all stores wired.
pub struct TestEnv {
    pub idp: TestIdp,
    pub replay_cache: Arc<InMemoryReplayCache>,
    pub sent_messages: Arc<InMemorySentMessageStore>,
    pub logout_handler: Arc<RecordingLogoutHandler>,
    pub request_id: String,
}

impl TestEnv {
    pub fn new() -> Self {
        let sent_messages = Arc::new(InMemorySentMessageStore::new());
        let request = AuthnRequest::new(SP_ENTITY_ID).with_acs_url(ACS_URL);
        let request_id = request.id.clone();
        sent_messages.put(request.into());

        Self {
            idp: TestIdp::new(),
            replay_cache: Arc::new(InMemoryReplayCache::new()),
            sent_messages,
            logout_handler: Arc::new(RecordingLogoutHandler::new()),
            request_id,
        }
    }

    /// A validator wired to every store in this environment.
    pub fn validator(&self) -> AuthnResponseValidator {
        AuthnResponseValidator::new(StaticTrustEngineProvider::new(self.idp.trust_engine()))
            .with_replay_cache(self.replay_cache.clone())
            .with_sent_message_store(self.sent_messages.clone())
            .with_logout_handler(self.logout_handler.clone())
    }

    pub fn context(&self) -> MessageContext {
        MessageContext::new(
            SpConfiguration::new(SP_ENTITY_ID),
            AcsEndpoint::post(ACS_URL),
            IDP_ENTITY_ID,
        )
    }

    /// A freshly minted assertion the way the happy path expects it.
    pub fn assertion(&self) -> Assertion {
        let assertion = Assertion::new(IDP_ENTITY_ID)
            .with_subject(
                Subject::new(NameId::new("jdoe")).with_confirmation(
                    SubjectConfirmation::bearer().with_data(
                        SubjectConfirmationData::for_request(&self.request_id, ACS_URL)
                            .expires_at(Utc::now() + Duration::seconds(300)),
                    ),
                ),
            )
            .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID))
            .with_authn_statement(
                AuthnStatement::new(AuthnContextClass::PasswordProtectedTransport)
                    .at(Utc::now() - Duration::seconds(10))
                    .with_session_index("s1"),
            )
            .with_attribute_statement(
                AttributeStatement::new()
                    .with_attribute(Attribute::single("mail", "jdoe@example.com")),
            );
        self.signed(assertion)
    }

    /// Attaches an IdP signature over the assertion's canonical content.
    pub fn signed(&self, assertion: Assertion) -> Assertion {
        let content = canonical_content(&assertion);
        let signature = self.idp.sign(&content);
        assertion.with_signature(signature)
    }

    /// A complete valid response carrying the given assertion.
    pub fn response_with(&self, assertion: Assertion) -> Response {
        Response::success(IDP_ENTITY_ID)
            .in_response_to(&self.request_id)
            .with_destination(ACS_URL)
            .with_assertion(assertion)
    }

    pub fn response(&self) -> Response {
        self.response_with(self.assertion())
    }
}

/// Deterministic stand-in for the canonical octets the XML layer signs.
pub fn canonical_content(assertion: &Assertion) -> Vec<u8> {
    serde_json::to_vec(&(
        &assertion.id,
        &assertion.issuer.value,
        &assertion.issue_instant,
    ))
    .expect("serialize assertion content")
}

/// Decrypter over base64-encoded JSON payloads.
pub struct JsonDecrypter;

fn decode<T: serde::de::DeserializeOwned>(data: &EncryptedData) -> Result<T, DecryptionError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&data.cipher_value)
        .map_err(|e| DecryptionError(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| DecryptionError(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> EncryptedData {
    let bytes = serde_json::to_vec(value).expect("serialize payload");
    EncryptedData::new(base64::engine::general_purpose::STANDARD.encode(bytes))
}

impl Decrypter for JsonDecrypter {
    fn decrypt_assertion(
        &self,
        encrypted: &EncryptedAssertion,
    ) -> Result<Assertion, DecryptionError> {
        decode(&encrypted.encrypted_data)
    }

    fn decrypt_name_id(&self, encrypted: &EncryptedId) -> Result<NameId, DecryptionError> {
        decode(&encrypted.encrypted_data)
    }

    fn decrypt_attribute(
        &self,
        encrypted: &sp_saml::types::EncryptedAttribute,
    ) -> Result<Attribute, DecryptionError> {
        decode(&encrypted.encrypted_data)
    }
}

/// Encrypts an assertion into the form [`JsonDecrypter`] understands.
pub fn encrypt_assertion(assertion: &Assertion) -> EncryptedAssertion {
    EncryptedAssertion {
        encrypted_data: encode(assertion),
    }
}

/// Encrypts a name id into the form [`JsonDecrypter`] understands.
pub fn encrypt_name_id(name_id: &NameId) -> EncryptedId {
    EncryptedId {
        encrypted_data: encode(name_id),
    }
}
