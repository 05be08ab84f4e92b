//! Per-message validation context.
//!
//! The read-only view threaded through validation: configuration snapshot,
//! the receiving endpoint, and what is known about the peer. The validator
//! keeps its own per-request working set and returns only the credential.

use serde::{Deserialize, Serialize};

use crate::config::SpConfiguration;
use crate::types::SamlBinding;

/// The SP assertion-consumer endpoint a response arrived at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcsEndpoint {
    /// Endpoint location URL.
    pub location: String,

    /// Alternate response location, when the metadata declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_location: Option<String>,

    /// Index of this endpoint in the SP metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u16>,

    /// Binding URI this endpoint serves.
    pub binding: String,
}

impl AcsEndpoint {
    /// Creates an HTTP-POST endpoint at the given location.
    #[must_use]
    pub fn post(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            response_location: None,
            index: None,
            binding: SamlBinding::HttpPost.uri().to_string(),
        }
    }

    /// Sets the alternate response location.
    #[must_use]
    pub fn with_response_location(mut self, url: impl Into<String>) -> Self {
        self.response_location = Some(url.into());
        self
    }

    /// Sets the metadata index.
    #[must_use]
    pub const fn with_index(mut self, index: u16) -> Self {
        self.index = Some(index);
        self
    }

    /// The URLs a response destined for this endpoint may carry.
    #[must_use]
    pub fn acceptable_urls(&self) -> Vec<&str> {
        let mut urls = vec![self.location.as_str()];
        if let Some(response_location) = &self.response_location {
            urls.push(response_location.as_str());
        }
        urls
    }
}

/// Context for validating one inbound response.
#[derive(Debug, Clone)]
pub struct MessageContext {
    /// Configuration snapshot.
    pub config: SpConfiguration,

    /// The endpoint the response arrived at.
    pub endpoint: AcsEndpoint,

    /// The expected identity provider entity ID.
    pub peer_entity_id: String,

    /// Whether the peer was already authenticated at the transport layer.
    pub peer_authenticated: bool,

    /// `WantAssertionsSigned` from the SP metadata descriptor, when one is
    /// in play; overrides the configured flag.
    pub sp_descriptor_wants_assertions_signed: Option<bool>,

    /// The binding URI the response actually arrived over.
    pub inbound_binding: Option<String>,
}

impl MessageContext {
    /// Creates a context for a response from the given peer.
    #[must_use]
    pub fn new(
        config: SpConfiguration,
        endpoint: AcsEndpoint,
        peer_entity_id: impl Into<String>,
    ) -> Self {
        Self {
            config,
            endpoint,
            peer_entity_id: peer_entity_id.into(),
            peer_authenticated: false,
            sp_descriptor_wants_assertions_signed: None,
            inbound_binding: None,
        }
    }

    /// Marks the peer as authenticated at the transport layer.
    #[must_use]
    pub const fn peer_authenticated(mut self, authenticated: bool) -> Self {
        self.peer_authenticated = authenticated;
        self
    }

    /// Applies the SP descriptor's `WantAssertionsSigned` flag.
    #[must_use]
    pub const fn with_sp_descriptor_wants_assertions_signed(mut self, wanted: bool) -> Self {
        self.sp_descriptor_wants_assertions_signed = Some(wanted);
        self
    }

    /// Records the binding the response arrived over.
    #[must_use]
    pub fn with_inbound_binding(mut self, binding: SamlBinding) -> Self {
        self.inbound_binding = Some(binding.uri().to_string());
        self
    }

    /// Whether assertions must be signed, with the SP descriptor taking
    /// precedence over configuration when available.
    #[must_use]
    pub fn wants_assertions_signed(&self) -> bool {
        self.sp_descriptor_wants_assertions_signed
            .unwrap_or(self.config.wants_assertions_signed)
    }
}
