//! SAML response validation.
//!
//! [`AuthnResponseValidator`] executes every check required for accepting a
//! SAML response: protocol-level checks on the envelope, decryption of
//! encrypted assertions, selection and validation of the authn-bearing
//! assertion, bearer subject confirmation, replay detection, and finally
//! derivation of the authenticated principal.
//!
//! The validator is stateless across invocations except through the
//! injected stores; `validate` is a synchronous call safe to run
//! concurrently from independent requests.

mod assertion;
mod protocol;
pub mod time;
mod uri;

pub use uri::{DefaultUriComparator, UriComparator};

use std::sync::Arc;

use chrono::{Duration, Utc};
use sp_cache::ReplayCacheProvider;

use crate::context::MessageContext;
use crate::credentials::{
    AttributeConverter, AuthnCredentials, DirectAttributeConverter, SamlAttribute,
};
use crate::decryption::{decrypt_attributes, decrypted_assertions, Decrypter};
use crate::error::{ValidationError, ValidationResult};
use crate::signature::SignatureTrustEngineProvider;
use crate::store::{SentMessageStore, SessionLogoutHandler};
use crate::types::{Assertion, BaseId, Issuer, NameId, Response, SubjectConfirmation};

/// Replay scope for response envelope ids, distinct from the assertion
/// scope so the two id spaces never collide.
const MESSAGE_REPLAY_SCOPE: &str = "sp_saml::validator::AuthnResponseValidator::messages";

/// Validates `AuthnResponse` messages and extracts the authenticated
/// principal.
pub struct AuthnResponseValidator {
    engine_provider: Arc<dyn SignatureTrustEngineProvider>,
    decrypter: Option<Arc<dyn Decrypter>>,
    replay_cache: Option<Arc<dyn ReplayCacheProvider>>,
    sent_message_store: Option<Arc<dyn SentMessageStore>>,
    logout_handler: Option<Arc<dyn SessionLogoutHandler>>,
    uri_comparator: Arc<dyn UriComparator>,
    attribute_converter: Arc<dyn AttributeConverter>,
}

/// Subject identifiers and confirmations established while validating one
/// assertion.
#[derive(Debug, Default)]
struct SubjectOutcome {
    name_id: Option<NameId>,
    base_id: Option<BaseId>,
    confirmations: Vec<SubjectConfirmation>,
}

/// The assertion selected to carry the authentication, together with its
/// subject outcome.
struct ValidatedAssertion {
    assertion: Assertion,
    subject: SubjectOutcome,
}

impl AuthnResponseValidator {
    /// Creates a validator with the given trust engine provider and the
    /// default URI comparator and attribute converter.
    #[must_use]
    pub fn new(engine_provider: impl SignatureTrustEngineProvider + 'static) -> Self {
        Self {
            engine_provider: Arc::new(engine_provider),
            decrypter: None,
            replay_cache: None,
            sent_message_store: None,
            logout_handler: None,
            uri_comparator: Arc::new(DefaultUriComparator),
            attribute_converter: Arc::new(DirectAttributeConverter),
        }
    }

    /// Configures a decrypter for encrypted assertions, ids and attributes.
    #[must_use]
    pub fn with_decrypter(mut self, decrypter: impl Decrypter + 'static) -> Self {
        self.decrypter = Some(Arc::new(decrypter));
        self
    }

    /// Configures the replay cache.
    #[must_use]
    pub fn with_replay_cache(mut self, cache: Arc<dyn ReplayCacheProvider>) -> Self {
        self.replay_cache = Some(cache);
        self
    }

    /// Configures the sent-message store used for `InResponseTo` binding.
    #[must_use]
    pub fn with_sent_message_store(mut self, store: Arc<dyn SentMessageStore>) -> Self {
        self.sent_message_store = Some(store);
        self
    }

    /// Configures the Single Logout bookkeeping hook.
    #[must_use]
    pub fn with_logout_handler(mut self, handler: Arc<dyn SessionLogoutHandler>) -> Self {
        self.logout_handler = Some(handler);
        self
    }

    /// Replaces the URI comparator.
    #[must_use]
    pub fn with_uri_comparator(mut self, comparator: impl UriComparator + 'static) -> Self {
        self.uri_comparator = Arc::new(comparator);
        self
    }

    /// Replaces the attribute converter.
    #[must_use]
    pub fn with_attribute_converter(
        mut self,
        converter: impl AttributeConverter + 'static,
    ) -> Self {
        self.attribute_converter = Arc::new(converter);
        self
    }

    /// Validates a response and extracts the authentication credentials.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered; every kind is
    /// fatal and prevents credential construction.
    pub fn validate(
        &self,
        response: &Response,
        context: &MessageContext,
    ) -> ValidationResult<AuthnCredentials> {
        let engine = self.engine_provider.build();

        self.verify_message_replay(response, context)?;
        self.validate_protocol_response(response, context, engine.as_ref())?;

        let assertions = decrypted_assertions(response, self.decrypter.as_deref());
        let selected = self.select_subject_assertion(assertions, context, engine.as_ref())?;

        self.build_credentials(response, context, &selected)
    }

    /// Rejects a response whose envelope id was already accepted.
    ///
    /// Runs once per response, before any protocol check.
    fn verify_message_replay(
        &self,
        response: &Response,
        context: &MessageContext,
    ) -> ValidationResult<()> {
        let Some(cache) = &self.replay_cache else {
            tracing::warn!("no replay cache specified, skipping message replay verification");
            return Ok(());
        };

        if response.id.is_empty() {
            return Err(ValidationError::Replay(
                "the response does not have an id".to_string(),
            ));
        }

        let lifetime = context.config.maximum_authentication_lifetime.max(0);
        let expires =
            Utc::now() + Duration::seconds(lifetime + context.config.accepted_skew.max(0));
        if !cache.check(MESSAGE_REPLAY_SCOPE, &response.id, expires) {
            return Err(ValidationError::Replay(format!(
                "rejecting replayed response id '{}'",
                response.id
            )));
        }
        Ok(())
    }

    /// Checks an issuer against the expected peer entity.
    fn validate_issuer(&self, issuer: &Issuer, context: &MessageContext) -> ValidationResult<()> {
        if !issuer.has_entity_format() {
            return Err(ValidationError::InvalidMessage(format!(
                "issuer format is not entity but {}",
                issuer.format.as_deref().unwrap_or_default()
            )));
        }
        if issuer.value != context.peer_entity_id {
            return Err(ValidationError::IssuerMismatch {
                expected: context.peer_entity_id.clone(),
                actual: issuer.value.clone(),
            });
        }
        Ok(())
    }

    /// Assembles the credential from the selected assertion.
    fn build_credentials(
        &self,
        response: &Response,
        context: &MessageContext,
        selected: &ValidatedAssertion,
    ) -> ValidationResult<AuthnCredentials> {
        let assertion = &selected.assertion;
        let converter = self.attribute_converter.as_ref();

        let mut attributes = Vec::new();
        for statement in &assertion.attribute_statements {
            for attribute in &statement.attributes {
                attributes.push(SamlAttribute::from_attribute(converter, attribute));
            }
            for attribute in
                decrypt_attributes(&statement.encrypted_attributes, self.decrypter.as_deref())
            {
                attributes.push(SamlAttribute::from_attribute(converter, &attribute));
            }
        }

        let name_id = self.determine_name_id(context, &attributes, &selected.subject)?;

        let session_index = assertion
            .authn_statements
            .first()
            .and_then(|s| s.session_index.clone());

        if let Some(handler) = &self.logout_handler {
            if let Some(key) = compute_slo_key(session_index.as_deref(), &name_id) {
                handler.record_session(&key);
            }
        }

        let mut authn_context_class_refs = Vec::new();
        let mut authenticating_authorities = Vec::new();
        for statement in &assertion.authn_statements {
            if let Some(class_ref) = &statement.authn_context.authn_context_class_ref {
                authn_context_class_refs.push(class_ref.clone());
            }
            authenticating_authorities
                .extend(statement.authn_context.authenticating_authorities.iter().cloned());
        }

        Ok(AuthnCredentials {
            name_id,
            issuer_entity_id: assertion.issuer.value.clone(),
            attributes,
            conditions: assertion.conditions.clone(),
            session_index,
            authn_context_class_refs,
            authenticating_authorities,
            in_response_to: response.in_response_to.clone(),
        })
    }

    /// Determines the principal's name ID.
    ///
    /// A configured name-id attribute takes precedence; otherwise the
    /// identifier recorded during subject validation is used. Reaching this
    /// point without one means the preceding checks were inconsistent.
    fn determine_name_id(
        &self,
        context: &MessageContext,
        attributes: &[SamlAttribute],
        subject: &SubjectOutcome,
    ) -> ValidationResult<NameId> {
        if let Some(attribute_name) = &context.config.name_id_attribute {
            let from_attribute = attributes
                .iter()
                .find(|a| &a.name == attribute_name)
                .and_then(SamlAttribute::to_name_id);
            if let Some(name_id) = from_attribute {
                return Ok(name_id);
            }
        }

        subject.name_id.clone().ok_or_else(|| {
            ValidationError::NoSubjectAssertion(
                "subject name identifier is missing after validation".to_string(),
            )
        })
    }
}

/// Computes the key under which the session is recorded for Single Logout:
/// the session index when present, the name-id value otherwise.
fn compute_slo_key(session_index: Option<&str>, name_id: &NameId) -> Option<String> {
    match session_index {
        Some(index) if !index.is_empty() => Some(index.to_string()),
        _ if !name_id.value.is_empty() => Some(name_id.value.clone()),
        _ => None,
    }
}
