//! Assertion selection, subject confirmation and authn statement checks.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use sp_cache::ReplayCacheProvider as _;
use url::Url;

use crate::context::MessageContext;
use crate::decryption::decrypt_id;
use crate::error::{ValidationError, ValidationResult};
use crate::signature::{SignatureTrustEngine, XmlSignature};
use crate::types::{
    Assertion, AudienceRestriction, AuthnStatement, Conditions, Subject, SubjectConfirmationData,
    SAML_VERSION_20,
};

use super::{AuthnResponseValidator, SubjectOutcome, UriComparator as _, ValidatedAssertion};

impl AuthnResponseValidator {
    /// Picks the first authn-bearing assertion that passes validation.
    ///
    /// Per-assertion errors are collected; the first one surfaces only when
    /// no assertion ultimately succeeds.
    pub(super) fn select_subject_assertion(
        &self,
        assertions: Vec<Assertion>,
        context: &MessageContext,
        engine: &dyn SignatureTrustEngine,
    ) -> ValidationResult<ValidatedAssertion> {
        let mut first_error: Option<ValidationError> = None;
        let mut selected: Option<ValidatedAssertion> = None;

        for assertion in assertions {
            if assertion.authn_statements.is_empty() {
                continue;
            }
            match self.validate_assertion(&assertion, context, engine) {
                Ok(subject) => {
                    selected = Some(ValidatedAssertion { assertion, subject });
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        assertion_id = %assertion.id,
                        "assertion validation failed, continuing with the next one: {e}"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        let Some(selected) = selected else {
            return Err(first_error.unwrap_or_else(|| {
                ValidationError::NoSubjectAssertion(
                    "no valid subject assertion found in response".to_string(),
                )
            }));
        };

        // Encrypted ids were already folded into the outcome, so at this
        // point the subject must have left an identifier behind somewhere,
        // unless the name id is configured to come from an attribute.
        if selected.subject.confirmations.is_empty()
            && context.config.name_id_attribute.is_none()
            && selected.subject.name_id.is_none()
            && selected.subject.base_id.is_none()
        {
            return Err(ValidationError::NoSubjectAssertion(
                "subject NameID, BaseID and EncryptedID cannot all be absent without subject confirmations"
                    .to_string(),
            ));
        }

        Ok(selected)
    }

    /// Validates one assertion end to end.
    fn validate_assertion(
        &self,
        assertion: &Assertion,
        context: &MessageContext,
        engine: &dyn SignatureTrustEngine,
    ) -> ValidationResult<SubjectOutcome> {
        if assertion.version != SAML_VERSION_20 {
            return Err(ValidationError::InvalidMessage(format!(
                "invalid SAML assertion version: {}",
                assertion.version
            )));
        }

        if !super::time::is_within(
            assertion.issue_instant,
            context.config.maximum_authentication_lifetime,
            context.config.accepted_skew,
            Utc::now(),
        ) {
            return Err(ValidationError::IssueInstant);
        }

        self.validate_issuer(&assertion.issuer, context)?;

        let subject = match &assertion.subject {
            Some(subject) => self.validate_subject(subject, &assertion.id, context)?,
            None => {
                return Err(ValidationError::NoSubjectAssertion(
                    "assertion subject cannot be absent".to_string(),
                ));
            }
        };

        self.validate_assertion_conditions(assertion.conditions.as_ref(), context)?;
        self.validate_authn_statements(&assertion.authn_statements, context)?;
        self.validate_assertion_signature(assertion.signature.as_ref(), context, engine)?;

        Ok(subject)
    }

    /// Validates the subject by finding a valid bearer confirmation.
    ///
    /// Identifiers are read from the subject first; when it carries none,
    /// they are taken from the first accepted bearer confirmation.
    fn validate_subject(
        &self,
        subject: &Subject,
        assertion_id: &str,
        context: &MessageContext,
    ) -> ValidationResult<SubjectOutcome> {
        let mut outcome = SubjectOutcome::default();
        let mut saml_id_found = false;

        let mut name_id = subject.name_id.clone();
        // An encrypted id supersedes the cleartext one.
        if let Some(decrypted) = decrypt_id(subject.encrypted_id.as_ref(), self.decrypter.as_deref())
        {
            name_id = Some(decrypted);
        }
        if name_id.is_some() || subject.base_id.is_some() {
            outcome.name_id = name_id;
            outcome.base_id = subject.base_id.clone();
            saml_id_found = true;
        }

        for confirmation in &subject.subject_confirmations {
            if !confirmation.is_bearer() {
                continue;
            }
            let Some(data) = confirmation.subject_confirmation_data.as_ref() else {
                tracing::debug!("subject confirmation data cannot be absent for bearer confirmation");
                continue;
            };
            if !self.is_valid_bearer_confirmation_data(data, context) {
                continue;
            }

            self.validate_assertion_replay(assertion_id, data, context)?;

            let mut confirmation_name_id = confirmation.name_id.clone();
            if let Some(decrypted) =
                decrypt_id(confirmation.encrypted_id.as_ref(), self.decrypter.as_deref())
            {
                confirmation_name_id = Some(decrypted);
            }

            if !saml_id_found
                && (confirmation_name_id.is_some() || confirmation.base_id.is_some())
            {
                outcome.name_id = confirmation_name_id;
                outcome.base_id = confirmation.base_id.clone();
                outcome.confirmations.push(confirmation.clone());
                saml_id_found = true;
            }
            if !saml_id_found {
                tracing::warn!(
                    "could not find any subject NameID/BaseID/EncryptedID, neither directly in \
                     the subject nor in any subject confirmation"
                );
            }
            return Ok(outcome);
        }

        Err(ValidationError::SubjectConfirmation)
    }

    /// Checks bearer confirmation data: no `notBefore`, unexpired
    /// `notOnOrAfter`, recipient equal to the endpoint location.
    fn is_valid_bearer_confirmation_data(
        &self,
        data: &SubjectConfirmationData,
        context: &MessageContext,
    ) -> bool {
        if data.not_before.is_some() {
            tracing::debug!("subject confirmation notBefore must be absent for bearer confirmation");
            return false;
        }

        let Some(not_on_or_after) = data.not_on_or_after else {
            tracing::debug!("subject confirmation notOnOrAfter is required for bearer confirmation");
            return false;
        };
        if !super::time::not_on_or_after_ok(not_on_or_after, Utc::now(), context.config.accepted_skew)
        {
            tracing::debug!("subject confirmation notOnOrAfter is too old");
            return false;
        }

        let Some(recipient) = data.recipient.as_deref() else {
            tracing::debug!("subject confirmation recipient is required for bearer confirmation");
            return false;
        };
        if Url::parse(recipient).is_err() {
            tracing::warn!(recipient, "subject confirmation recipient is not a valid URI");
            return false;
        }
        if !self.uri_comparator.equal(recipient, &context.endpoint.location) {
            tracing::debug!(
                recipient,
                endpoint = %context.endpoint.location,
                "subject confirmation recipient does not match the SP assertion consumer URL"
            );
            return false;
        }

        true
    }

    /// Rejects a bearer assertion whose id was already accepted.
    fn validate_assertion_replay(
        &self,
        assertion_id: &str,
        data: &SubjectConfirmationData,
        context: &MessageContext,
    ) -> ValidationResult<()> {
        let Some(cache) = &self.replay_cache else {
            tracing::warn!("no replay cache specified, skipping replay verification");
            return Ok(());
        };

        if assertion_id.is_empty() {
            return Err(ValidationError::Replay(
                "the assertion does not have an id".to_string(),
            ));
        }

        let Some(not_on_or_after) = data.not_on_or_after else {
            return Err(ValidationError::Replay(
                "bearer confirmation data carries no notOnOrAfter".to_string(),
            ));
        };
        let expires = not_on_or_after + Duration::seconds(context.config.accepted_skew);
        if !cache.check(std::any::type_name::<Self>(), assertion_id, expires) {
            return Err(ValidationError::Replay(format!(
                "rejecting replayed assertion id '{assertion_id}'"
            )));
        }
        Ok(())
    }

    /// Validates conditions and their audience restrictions.
    fn validate_assertion_conditions(
        &self,
        conditions: Option<&Conditions>,
        context: &MessageContext,
    ) -> ValidationResult<()> {
        let Some(conditions) = conditions else {
            return Ok(());
        };

        let now = Utc::now();
        let skew = context.config.accepted_skew;

        if let Some(not_before) = conditions.not_before {
            if !super::time::not_before_ok(not_before, now, skew) {
                return Err(ValidationError::AssertionCondition("notBefore".to_string()));
            }
        }
        if let Some(not_on_or_after) = conditions.not_on_or_after {
            if !super::time::not_on_or_after_ok(not_on_or_after, now, skew) {
                return Err(ValidationError::AssertionCondition("notOnOrAfter".to_string()));
            }
        }

        validate_audience_restrictions(
            &conditions.audience_restrictions,
            &context.config.sp_entity_id,
        )
    }

    /// Validates authn statements and the required context class refs.
    fn validate_authn_statements(
        &self,
        statements: &[AuthnStatement],
        context: &MessageContext,
    ) -> ValidationResult<()> {
        let now = Utc::now();
        let mut provided_class_refs = Vec::new();

        for statement in statements {
            if !super::time::is_within(
                statement.authn_instant,
                context.config.maximum_authentication_lifetime,
                context.config.accepted_skew,
                now,
            ) {
                return Err(ValidationError::AuthnInstant);
            }
            // The session end is compared without skew; an ended IdP
            // session cannot be revived by clock tolerance.
            if let Some(session_end) = statement.session_not_on_or_after {
                if session_end <= now {
                    return Err(ValidationError::AuthnSessionCriteria);
                }
            }
            if let Some(class_ref) = &statement.authn_context.authn_context_class_ref {
                provided_class_refs.push(class_ref.clone());
            }
        }

        self.validate_authn_context_class_refs(context, &provided_class_refs)
    }

    /// Requires every configured context class ref to be present.
    fn validate_authn_context_class_refs(
        &self,
        context: &MessageContext,
        provided: &[String],
    ) -> ValidationResult<()> {
        let required = &context.config.required_authn_context_class_refs;
        if required.is_empty() {
            return Ok(());
        }

        tracing::debug!(?required, ?provided, "checking authentication context class refs");
        let provided: HashSet<&str> = provided.iter().map(String::as_str).collect();
        if required.iter().any(|r| !provided.contains(r.as_str())) {
            return Err(ValidationError::AuthnContextClassRef);
        }
        Ok(())
    }

    /// Enforces the assertion signing policy.
    fn validate_assertion_signature(
        &self,
        signature: Option<&XmlSignature>,
        context: &MessageContext,
        engine: &dyn SignatureTrustEngine,
    ) -> ValidationResult<()> {
        match signature {
            Some(signature) => engine.verify(signature, &context.peer_entity_id),
            None => {
                if context.wants_assertions_signed() {
                    return Err(ValidationError::SignatureRequired(
                        "assertion must be explicitly signed".to_string(),
                    ));
                }
                if !context.peer_authenticated
                    && !context.config.all_signature_validation_disabled
                {
                    return Err(ValidationError::SignatureRequired(
                        "unauthenticated response contains an unsigned assertion".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Audience restrictions must exist and contain this service provider.
fn validate_audience_restrictions(
    restrictions: &[AudienceRestriction],
    sp_entity_id: &str,
) -> ValidationResult<()> {
    if restrictions.is_empty() {
        return Err(ValidationError::AudienceRestriction(
            "audience restrictions cannot be empty".to_string(),
        ));
    }

    let audiences: HashSet<&str> = restrictions
        .iter()
        .flat_map(|r| r.audiences.iter().map(String::as_str))
        .collect();
    if !audiences.contains(sp_entity_id) {
        return Err(ValidationError::AudienceRestriction(format!(
            "assertion audience {audiences:?} does not match SP configuration {sp_entity_id}"
        )));
    }
    Ok(())
}
