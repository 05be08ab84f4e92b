//! Protocol-level checks on the response envelope.
//!
//! Run strictly in order so that cheaper and more diagnostic failures
//! surface before cryptographic work: status, version, signature, issue
//! instant, `InResponseTo` binding, destination, request cross-checks,
//! issuer.

use chrono::Utc;

use crate::context::MessageContext;
use crate::error::{ValidationError, ValidationResult};
use crate::signature::{verify_if_present, SignatureTrustEngine};
use crate::store::SentMessageStore as _;
use crate::types::{AuthnRequest, Response, SAML_VERSION_20};

use super::{time, AuthnResponseValidator, UriComparator as _};

impl AuthnResponseValidator {
    /// Validates the response envelope.
    pub(super) fn validate_protocol_response(
        &self,
        response: &Response,
        context: &MessageContext,
        engine: &dyn SignatureTrustEngine,
    ) -> ValidationResult<()> {
        if !response.status.is_success() {
            return Err(ValidationError::StatusFailure {
                chain: response.status.chain(),
                message: response.status.status_message.clone(),
            });
        }

        if response.version != SAML_VERSION_20 {
            return Err(ValidationError::InvalidMessage(format!(
                "invalid SAML version assigned to the response: {}",
                response.version
            )));
        }

        if context.config.wants_responses_signed && response.signature.is_none() {
            tracing::debug!(
                response_id = %response.id,
                "configured to enforce signatures on responses but the returned response carries none"
            );
            return Err(ValidationError::SignatureRequired(
                "unable to find a signature on the SAML response returned".to_string(),
            ));
        }
        verify_if_present(response.signature.as_ref(), &context.peer_entity_id, engine)?;

        if !time::is_within(
            response.issue_instant,
            context.config.maximum_authentication_lifetime,
            context.config.accepted_skew,
            Utc::now(),
        ) {
            return Err(ValidationError::IssueInstant);
        }

        let original_request = self.lookup_original_request(response)?;

        self.verify_endpoint(response.destination.as_deref(), context)?;

        if let Some(request) = &original_request {
            self.verify_request(request, context);
        }

        if let Some(issuer) = &response.issuer {
            self.validate_issuer(issuer, context)?;
        }

        Ok(())
    }

    /// Resolves `InResponseTo` against the sent-message store.
    ///
    /// Without a store, or without an `InResponseTo` id, there is nothing
    /// to bind and the lookup is skipped.
    fn lookup_original_request(
        &self,
        response: &Response,
    ) -> ValidationResult<Option<AuthnRequest>> {
        let (Some(store), Some(in_response_to)) =
            (&self.sent_message_store, &response.in_response_to)
        else {
            return Ok(None);
        };

        let Some(message) = store.get(in_response_to) else {
            return Err(ValidationError::InResponseToMismatch(format!(
                "InResponseTo of the response doesn't correspond to a sent message: {in_response_to}"
            )));
        };

        match message.as_authn_request() {
            Some(request) => Ok(Some(request.clone())),
            None => Err(ValidationError::InResponseToMismatch(format!(
                "sent message was of a different type than the expected AuthnRequest: {in_response_to}"
            ))),
        }
    }

    /// Checks the response destination against the receiving endpoint.
    fn verify_endpoint(
        &self,
        destination: Option<&str>,
        context: &MessageContext,
    ) -> ValidationResult<()> {
        let acceptable = context.endpoint.acceptable_urls();
        match destination {
            Some(destination) => {
                let matched = acceptable
                    .iter()
                    .any(|url| self.uri_comparator.equal(destination, url));
                if !matched {
                    return Err(ValidationError::EndpointMismatch(format!(
                        "intended destination {destination} doesn't match any of the endpoint URLs {acceptable:?}"
                    )));
                }
            }
            None => {
                if context.config.response_destination_mandatory {
                    return Err(ValidationError::EndpointMismatch(
                        "destination is mandatory but the response does not carry one".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Diagnoses mismatches against the original request.
    ///
    /// The profile leaves these informational, so they are warnings, never
    /// rejections.
    fn verify_request(&self, request: &AuthnRequest, context: &MessageContext) {
        if let Some(requested_index) = request.assertion_consumer_service_index {
            if Some(requested_index) != context.endpoint.index {
                tracing::warn!(
                    requested_index,
                    endpoint_index = ?context.endpoint.index,
                    "response was received at a different endpoint index than was requested"
                );
            }
            return;
        }

        if let Some(requested_url) = &request.assertion_consumer_service_url {
            let response_location = context
                .endpoint
                .response_location
                .as_deref()
                .unwrap_or(&context.endpoint.location);
            if requested_url != response_location {
                tracing::warn!(
                    requested = %requested_url,
                    actual = %response_location,
                    "response was received at a different endpoint URL than was requested"
                );
            }
        }

        if let Some(requested_binding) = &request.protocol_binding {
            if context.inbound_binding.as_deref() != Some(requested_binding.as_str()) {
                tracing::warn!(
                    requested = %requested_binding,
                    actual = ?context.inbound_binding,
                    "response was received using a different binding than was requested"
                );
            }
        }
    }
}
