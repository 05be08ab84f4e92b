//! Authentication credentials produced by a successful validation.

use serde::{Deserialize, Serialize};

use crate::types::{Attribute, Conditions, NameId};

/// Converts raw SAML attribute values into profile-ready values.
///
/// Implementations must be pure: same input, same output, no side effects.
pub trait AttributeConverter: Send + Sync {
    /// Converts the raw values of the named attribute.
    fn convert(&self, name: &str, values: &[String]) -> Vec<String>;
}

/// Converter that passes attribute values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectAttributeConverter;

impl AttributeConverter for DirectAttributeConverter {
    fn convert(&self, _name: &str, values: &[String]) -> Vec<String> {
        values.to_vec()
    }
}

/// A converted SAML attribute carried on the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlAttribute {
    /// The attribute name.
    pub name: String,

    /// The format of the attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,

    /// A human-readable name for the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// The converted attribute values.
    pub values: Vec<String>,
}

impl SamlAttribute {
    /// Builds a credential attribute from an assertion attribute, running
    /// its values through the converter.
    #[must_use]
    pub fn from_attribute(converter: &dyn AttributeConverter, attribute: &Attribute) -> Self {
        Self {
            name: attribute.name.clone(),
            name_format: attribute.name_format.clone(),
            friendly_name: attribute.friendly_name.clone(),
            values: converter.convert(&attribute.name, &attribute.values),
        }
    }

    /// Synthesizes a name ID from this attribute's first value.
    ///
    /// Returns `None` when the attribute has no values.
    #[must_use]
    pub fn to_name_id(&self) -> Option<NameId> {
        let value = self.values.first()?;
        Some(NameId {
            value: value.clone(),
            format: self.name_format.clone(),
            name_qualifier: None,
            sp_name_qualifier: None,
            sp_provided_id: None,
        })
    }
}

/// The normalized outcome of a successfully validated response.
///
/// Everything the surrounding authentication framework needs to establish
/// a session for the principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnCredentials {
    /// The principal's name identifier.
    pub name_id: NameId,

    /// Entity ID of the assertion issuer.
    pub issuer_entity_id: String,

    /// Converted attributes from every attribute statement.
    pub attributes: Vec<SamlAttribute>,

    /// Snapshot of the selected assertion's conditions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Session index from the first authentication statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,

    /// Authentication context class refs across all statements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authn_context_class_refs: Vec<String>,

    /// Authenticating authorities across all statements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authenticating_authorities: Vec<String>,

    /// The `InResponseTo` id of the validated response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,
}

impl AuthnCredentials {
    /// Returns the first value of the named attribute.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.values.first())
            .map(String::as_str)
    }
}
