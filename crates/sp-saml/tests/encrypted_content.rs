//! Validation flows over encrypted assertions, identifiers and attributes.

mod common;

use sp_saml::types::{
    Assertion, Attribute, AttributeStatement, AuthnContextClass, AuthnStatement, Conditions,
    EncryptedAssertion, EncryptedAttribute, EncryptedData, NameId, Subject, SubjectConfirmation,
    SubjectConfirmationData,
};
use sp_saml::ValidationError;

use common::{
    encrypt_assertion, encrypt_name_id, JsonDecrypter, TestEnv, ACS_URL, IDP_ENTITY_ID,
    SP_ENTITY_ID,
};

fn encode_attribute(attribute: &Attribute) -> EncryptedAttribute {
    use base64::Engine;
    let bytes = serde_json::to_vec(attribute).expect("serialize attribute");
    EncryptedAttribute {
        encrypted_data: EncryptedData::new(base64::engine::general_purpose::STANDARD.encode(bytes)),
    }
}

#[test]
fn encrypted_assertion_is_decrypted_and_selected() {
    let env = TestEnv::new();
    let mut response = env.response_with(env.signed(
        Assertion::new(IDP_ENTITY_ID)
            .with_subject(Subject::new(NameId::new("ignored")))
            .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID)),
    ));
    response = response.with_encrypted_assertion(encrypt_assertion(&env.assertion()));

    let credentials = env
        .validator()
        .with_decrypter(JsonDecrypter)
        .validate(&response, &env.context())
        .expect("decrypted assertion validates");
    assert_eq!(credentials.name_id.value, "jdoe");
}

#[test]
fn malformed_encrypted_assertion_is_skipped_not_fatal() {
    let env = TestEnv::new();
    let mut response = env.response();
    response.encrypted_assertions.push(EncryptedAssertion {
        encrypted_data: EncryptedData::new("not base64!"),
    });

    // The cleartext assertion still carries the authentication.
    let credentials = env
        .validator()
        .with_decrypter(JsonDecrypter)
        .validate(&response, &env.context())
        .expect("cleartext assertion validates");
    assert_eq!(credentials.name_id.value, "jdoe");
}

#[test]
fn encrypted_assertions_without_a_decrypter_are_ignored() {
    let env = TestEnv::new();
    let response = env
        .response_with(env.signed(
            Assertion::new(IDP_ENTITY_ID)
                .with_subject(Subject::new(NameId::new("ignored")))
                .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID)),
        ))
        .with_encrypted_assertion(encrypt_assertion(&env.assertion()));

    assert!(matches!(
        env.validator().validate(&response, &env.context()),
        Err(ValidationError::NoSubjectAssertion(_))
    ));
}

#[test]
fn encrypted_id_supersedes_the_cleartext_name_id() {
    let env = TestEnv::new();
    let subject = Subject::new(NameId::new("cleartext-user"))
        .with_encrypted_id(encrypt_name_id(&NameId::new("encrypted-user")))
        .with_confirmation(
            SubjectConfirmation::bearer()
                .with_data(SubjectConfirmationData::for_request(&env.request_id, ACS_URL)),
        );
    let assertion = Assertion::new(IDP_ENTITY_ID)
        .with_subject(subject)
        .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID))
        .with_authn_statement(AuthnStatement::new(AuthnContextClass::PasswordProtectedTransport));
    let response = env.response_with(env.signed(assertion));

    let credentials = env
        .validator()
        .with_decrypter(JsonDecrypter)
        .validate(&response, &env.context())
        .expect("response validates");
    assert_eq!(credentials.name_id.value, "encrypted-user");
}

#[test]
fn encrypted_attributes_contribute_to_the_credentials() {
    let env = TestEnv::new();
    let assertion = Assertion::new(IDP_ENTITY_ID)
        .with_subject(
            Subject::new(NameId::new("jdoe")).with_confirmation(
                SubjectConfirmation::bearer()
                    .with_data(SubjectConfirmationData::for_request(&env.request_id, ACS_URL)),
            ),
        )
        .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID))
        .with_authn_statement(AuthnStatement::new(AuthnContextClass::PasswordProtectedTransport))
        .with_attribute_statement(
            AttributeStatement::new()
                .with_attribute(Attribute::single("mail", "jdoe@example.com"))
                .with_encrypted_attribute(encode_attribute(&Attribute::single(
                    "clearance", "secret",
                )))
                .with_encrypted_attribute(EncryptedAttribute {
                    encrypted_data: EncryptedData::new("garbage"),
                }),
        );
    let response = env.response_with(env.signed(assertion));

    let credentials = env
        .validator()
        .with_decrypter(JsonDecrypter)
        .validate(&response, &env.context())
        .expect("response validates");

    assert_eq!(credentials.attribute_value("mail"), Some("jdoe@example.com"));
    // The decryptable attribute made it; the malformed one was skipped.
    assert_eq!(credentials.attribute_value("clearance"), Some("secret"));
    assert_eq!(credentials.attributes.len(), 2);
}
