//! Service provider configuration.

use serde::{Deserialize, Serialize};

/// Configuration snapshot consumed by the response validator.
///
/// This is the per-client view of the SP configuration; loading it from
/// files or environment belongs to the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpConfiguration {
    /// This service provider's entity ID; also the expected audience.
    pub sp_entity_id: String,

    /// Whether response envelopes must carry a verified signature.
    pub wants_responses_signed: bool,

    /// Whether assertions must carry a verified signature.
    ///
    /// An SP metadata descriptor can override this per endpoint; see
    /// [`MessageContext`](crate::context::MessageContext).
    pub wants_assertions_signed: bool,

    /// Disables every signature check. Only meaningful in closed test
    /// setups.
    pub all_signature_validation_disabled: bool,

    /// Maximum authentication lifetime in seconds. Zero or negative
    /// disables the issue-instant and authn-instant windows.
    pub maximum_authentication_lifetime: i64,

    /// Accepted clock skew in seconds between SP and IdP clocks.
    pub accepted_skew: i64,

    /// Whether the response must carry a `Destination` attribute.
    pub response_destination_mandatory: bool,

    /// Authentication context class refs the IdP must all satisfy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_authn_context_class_refs: Vec<String>,

    /// Attribute whose first value becomes the principal's name ID,
    /// taking precedence over the subject identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_attribute: Option<String>,
}

impl SpConfiguration {
    /// Creates a configuration for the given SP entity ID with defaults.
    #[must_use]
    pub fn new(sp_entity_id: impl Into<String>) -> Self {
        Self {
            sp_entity_id: sp_entity_id.into(),
            wants_responses_signed: false,
            wants_assertions_signed: true,
            all_signature_validation_disabled: false,
            maximum_authentication_lifetime: 3600,
            accepted_skew: 300,
            response_destination_mandatory: false,
            required_authn_context_class_refs: Vec::new(),
            name_id_attribute: None,
        }
    }

    /// Requires signed response envelopes.
    #[must_use]
    pub const fn wants_responses_signed(mut self, wanted: bool) -> Self {
        self.wants_responses_signed = wanted;
        self
    }

    /// Requires signed assertions.
    #[must_use]
    pub const fn wants_assertions_signed(mut self, wanted: bool) -> Self {
        self.wants_assertions_signed = wanted;
        self
    }

    /// Disables all signature validation.
    #[must_use]
    pub const fn all_signature_validation_disabled(mut self, disabled: bool) -> Self {
        self.all_signature_validation_disabled = disabled;
        self
    }

    /// Sets the maximum authentication lifetime in seconds.
    #[must_use]
    pub const fn with_maximum_authentication_lifetime(mut self, seconds: i64) -> Self {
        self.maximum_authentication_lifetime = seconds;
        self
    }

    /// Sets the accepted clock skew in seconds.
    #[must_use]
    pub const fn with_accepted_skew(mut self, seconds: i64) -> Self {
        self.accepted_skew = seconds;
        self
    }

    /// Makes the response `Destination` attribute mandatory.
    #[must_use]
    pub const fn response_destination_mandatory(mut self, mandatory: bool) -> Self {
        self.response_destination_mandatory = mandatory;
        self
    }

    /// Requires the given authentication context class ref.
    #[must_use]
    pub fn require_authn_context_class_ref(mut self, class_ref: impl Into<String>) -> Self {
        self.required_authn_context_class_refs.push(class_ref.into());
        self
    }

    /// Derives the principal's name ID from the named attribute.
    #[must_use]
    pub fn with_name_id_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.name_id_attribute = Some(attribute.into());
        self
    }
}
