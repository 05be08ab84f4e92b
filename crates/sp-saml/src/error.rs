//! Validation error surface.
//!
//! Every kind is fatal to the current validation and prevents credential
//! construction. Per-item decryption failures are logged and skipped by the
//! decryption gateway instead of surfacing here; mismatches against the
//! original `AuthnRequest` are warnings, not errors.

use thiserror::Error;

/// Result type for response validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Classified reasons for rejecting a SAML response.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// The message is not an acceptable SAML response or carries a wrong
    /// protocol version.
    #[error("invalid SAML message: {0}")]
    InvalidMessage(String),

    /// The SAML status does not denote success.
    #[error("response status is not success: {}", chain.join(" / "))]
    StatusFailure {
        /// The status code chain, outermost first.
        chain: Vec<String>,
        /// The status message, when the identity provider supplied one.
        message: Option<String>,
    },

    /// A signature is required but missing.
    #[error("signature required: {0}")]
    SignatureRequired(String),

    /// A signature failed verification.
    #[error("signature validation failed: {0}")]
    SignatureValidation(String),

    /// The issuer does not match the expected peer entity.
    #[error("issuer {actual} does not match expected entity {expected}")]
    IssuerMismatch {
        /// The expected peer entity ID.
        expected: String,
        /// The issuer value found on the message.
        actual: String,
    },

    /// The issue instant lies outside the maximum authentication lifetime.
    #[error("issue instant is too old or in the future")]
    IssueInstant,

    /// `InResponseTo` does not correspond to a sent authentication request.
    #[error("InResponseTo does not correspond to a sent message: {0}")]
    InResponseToMismatch(String),

    /// The destination is not an acceptable endpoint, or is absent when
    /// required.
    #[error("endpoint mismatch: {0}")]
    EndpointMismatch(String),

    /// No authn-bearing assertion passed validation, or a subject was
    /// missing where one is required.
    #[error("no valid subject assertion: {0}")]
    NoSubjectAssertion(String),

    /// No bearer subject confirmation was accepted.
    #[error("subject confirmation validation failed")]
    SubjectConfirmation,

    /// An assertion condition (`notBefore` / `notOnOrAfter`) was violated.
    #[error("assertion condition {0} is not valid")]
    AssertionCondition(String),

    /// Audience restrictions are missing or do not contain this service
    /// provider.
    #[error("audience restriction not satisfied: {0}")]
    AudienceRestriction(String),

    /// An authentication instant is too old or in the future.
    #[error("authentication instant is too old or in the future")]
    AuthnInstant,

    /// The IdP session referenced by an authentication statement has ended.
    #[error("authentication session between IdP and subject has ended")]
    AuthnSessionCriteria,

    /// Required authentication context class refs are not all satisfied.
    #[error("required authentication context class refs not satisfied")]
    AuthnContextClassRef,

    /// The assertion id was seen before, or is missing while a replay cache
    /// is configured.
    #[error("replay rejected: {0}")]
    Replay(String),
}
