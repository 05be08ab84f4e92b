//! Outbound SAML message union.

use serde::{Deserialize, Serialize};

use super::{AuthnRequest, LogoutRequest};

/// A SAML message previously sent by the service provider.
///
/// The sent-message store is typed over this union so that an
/// `InResponseTo` lookup can tell an authentication request apart from any
/// other correlated message without runtime downcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SamlMessage {
    /// An authentication request.
    AuthnRequest(AuthnRequest),
    /// A logout request.
    LogoutRequest(LogoutRequest),
}

impl SamlMessage {
    /// Returns the message ID used for correlation.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::AuthnRequest(r) => &r.id,
            Self::LogoutRequest(r) => &r.id,
        }
    }

    /// Returns the contained authentication request, if that is what this is.
    #[must_use]
    pub fn as_authn_request(&self) -> Option<&AuthnRequest> {
        match self {
            Self::AuthnRequest(r) => Some(r),
            Self::LogoutRequest(_) => None,
        }
    }
}

impl From<AuthnRequest> for SamlMessage {
    fn from(request: AuthnRequest) -> Self {
        Self::AuthnRequest(request)
    }
}

impl From<LogoutRequest> for SamlMessage {
    fn from(request: LogoutRequest) -> Self {
        Self::LogoutRequest(request)
    }
}
