//! SAML 2.0 Web Browser SSO response validation for service providers.
//!
//! This crate decides whether an `AuthnResponse` received from an identity
//! provider is acceptable and, if so, extracts an authenticated principal
//! from it:
//!
//! - **Protocol checks** - status, version, issue instant, destination,
//!   `InResponseTo` binding, issuer, response signature
//! - **Assertion validation** - subject and bearer confirmation, conditions
//!   and audience restrictions, authn statements, assertion signature
//! - **Cryptographic pipeline** - signature verification against per-entity
//!   trust material, decryption of encrypted assertions, ids and attributes
//! - **Replay detection** - at-most-once acceptance of response and
//!   assertion ids within their validity windows
//! - **Principal derivation** - name id, attributes, session index and
//!   authentication context for the surrounding framework
//!
//! # Architecture
//!
//! - [`types`] - parsed SAML types handed over by the XML binding layer
//! - [`signature`] - signature model and trust engines
//! - [`decryption`] - decrypter contract and skip-on-failure gateway
//! - [`validator`] - the response validator itself
//! - [`credentials`] - the credential produced on success
//! - [`context`] / [`config`] - per-message view and configuration snapshot
//! - [`store`] - sent-message store and logout bookkeeping contracts
//! - [`error`] - the classified rejection surface
//!
//! HTTP bindings, XML parsing, metadata resolution and key provisioning are
//! the responsibility of the layers above; they reach this crate through
//! the types and traits re-exported here.
//!
//! # Example
//!
//! ```rust,ignore
//! use sp_saml::AuthnResponseValidator;
//!
//! let validator = AuthnResponseValidator::new(engine_provider)
//!     .with_replay_cache(cache)
//!     .with_sent_message_store(store);
//! let credentials = validator.validate(&response, &context)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod credentials;
pub mod decryption;
pub mod error;
pub mod signature;
pub mod store;
pub mod types;
pub mod validator;

pub use config::SpConfiguration;
pub use context::{AcsEndpoint, MessageContext};
pub use credentials::{AttributeConverter, AuthnCredentials, DirectAttributeConverter};
pub use error::{ValidationError, ValidationResult};
pub use validator::{AuthnResponseValidator, DefaultUriComparator, UriComparator};
