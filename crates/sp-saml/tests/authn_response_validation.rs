//! End-to-end response validation scenarios.
//!
//! Each test plays a full exchange: a sent authentication request, a
//! freshly minted IdP response, and the validator wired with a trust
//! engine, replay cache, sent-message store and logout bookkeeping.

mod common;

use chrono::{Duration, Utc};

use sp_saml::types::{
    Assertion, AuthnContextClass, AuthnStatement, Conditions, NameId, Subject, SubjectConfirmation,
    SubjectConfirmationData,
};
use sp_saml::ValidationError;

use common::{TestEnv, ACS_URL, IDP_ENTITY_ID, SP_ENTITY_ID};

#[test]
fn happy_path_produces_the_expected_credentials() {
    let env = TestEnv::new();
    let response = env.response();

    let credentials = env
        .validator()
        .validate(&response, &env.context())
        .expect("response validates");

    assert_eq!(credentials.name_id.value, "jdoe");
    assert_eq!(credentials.issuer_entity_id, IDP_ENTITY_ID);
    assert_eq!(credentials.in_response_to.as_deref(), Some(env.request_id.as_str()));
    assert_eq!(credentials.session_index.as_deref(), Some("s1"));
    assert_eq!(
        credentials.authn_context_class_refs,
        vec![AuthnContextClass::PasswordProtectedTransport.uri().to_string()]
    );
    assert_eq!(credentials.attribute_value("mail"), Some("jdoe@example.com"));
    assert!(credentials.conditions.is_some());

    // The session was handed to the logout bookkeeping under its index.
    assert_eq!(env.logout_handler.recorded(), vec!["s1".to_string()]);
}

#[test]
fn replayed_response_is_rejected_on_the_second_attempt() {
    let env = TestEnv::new();
    let response = env.response();
    let validator = env.validator();

    assert!(validator.validate(&response, &env.context()).is_ok());
    assert!(matches!(
        validator.validate(&response, &env.context()),
        Err(ValidationError::Replay(_))
    ));
}

#[test]
fn replayed_assertion_in_a_fresh_envelope_is_rejected() {
    let env = TestEnv::new();
    let assertion = env.assertion();
    let validator = env.validator();

    let first = env.response_with(assertion.clone());
    assert!(validator.validate(&first, &env.context()).is_ok());

    // New envelope id, same assertion id: the assertion replay guard fires.
    let second = env.response_with(assertion);
    assert!(matches!(
        validator.validate(&second, &env.context()),
        Err(ValidationError::Replay(_))
    ));
}

#[test]
fn audience_mismatch_is_rejected() {
    let env = TestEnv::new();
    let assertion = Assertion::new(IDP_ENTITY_ID)
        .with_subject(
            Subject::new(NameId::new("jdoe")).with_confirmation(
                SubjectConfirmation::bearer().with_data(SubjectConfirmationData::for_request(
                    &env.request_id,
                    ACS_URL,
                )),
            ),
        )
        .with_conditions(Conditions::with_validity(5).with_audience("https://other.example/entity"))
        .with_authn_statement(AuthnStatement::new(AuthnContextClass::PasswordProtectedTransport));
    let response = env.response_with(env.signed(assertion));

    assert!(matches!(
        env.validator().validate(&response, &env.context()),
        Err(ValidationError::AudienceRestriction(_))
    ));
}

#[test]
fn unsigned_assertion_is_rejected_when_signing_is_required() {
    let env = TestEnv::new();
    let assertion = Assertion::new(IDP_ENTITY_ID)
        .with_subject(
            Subject::new(NameId::new("jdoe")).with_confirmation(
                SubjectConfirmation::bearer().with_data(SubjectConfirmationData::for_request(
                    &env.request_id,
                    ACS_URL,
                )),
            ),
        )
        .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID))
        .with_authn_statement(AuthnStatement::new(AuthnContextClass::PasswordProtectedTransport));
    let response = env.response_with(assertion);

    let context = env.context();
    assert!(context.wants_assertions_signed());
    assert!(matches!(
        env.validator().validate(&response, &context),
        Err(ValidationError::SignatureRequired(_))
    ));
}

#[test]
fn tampered_assertion_signature_is_rejected() {
    let env = TestEnv::new();
    let mut assertion = env.assertion();
    if let Some(signature) = assertion.signature.as_mut() {
        signature.signed_content[0] ^= 0x01;
    }
    let response = env.response_with(assertion);

    assert!(matches!(
        env.validator().validate(&response, &env.context()),
        Err(ValidationError::SignatureValidation(_))
    ));
}

#[test]
fn unknown_in_response_to_is_rejected() {
    let env = TestEnv::new();
    let mut response = env.response();
    response.in_response_to = Some("_no_such_request".to_string());

    assert!(matches!(
        env.validator().validate(&response, &env.context()),
        Err(ValidationError::InResponseToMismatch(_))
    ));
}

#[test]
fn bearer_recipient_port_variant_is_accepted() {
    let env = TestEnv::new();
    let assertion = Assertion::new(IDP_ENTITY_ID)
        .with_subject(
            Subject::new(NameId::new("jdoe")).with_confirmation(
                SubjectConfirmation::bearer().with_data(SubjectConfirmationData::for_request(
                    &env.request_id,
                    "https://sp.example:443/acs",
                )),
            ),
        )
        .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID))
        .with_authn_statement(AuthnStatement::new(AuthnContextClass::PasswordProtectedTransport));
    let response = env.response_with(env.signed(assertion));

    assert!(env.validator().validate(&response, &env.context()).is_ok());
}

#[test]
fn signed_response_envelope_is_required_when_configured() {
    let env = TestEnv::new();
    let mut context = env.context();
    context.config.wants_responses_signed = true;

    let unsigned = env.response();
    assert!(matches!(
        env.validator().validate(&unsigned, &context),
        Err(ValidationError::SignatureRequired(_))
    ));

    let mut signed = env.response();
    signed.signature = Some(env.idp.sign(signed.id.as_bytes()));
    assert!(env.validator().validate(&signed, &context).is_ok());
}

#[test]
fn assertion_without_authn_statements_is_skipped() {
    let env = TestEnv::new();
    let bare = env.signed(
        Assertion::new(IDP_ENTITY_ID)
            .with_subject(Subject::new(NameId::new("ignored")))
            .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID)),
    );
    // Only the second assertion carries authn statements; it is selected.
    let response = env.response_with(bare).with_assertion(env.assertion());

    let credentials = env
        .validator()
        .validate(&response, &env.context())
        .expect("second assertion is selected");
    assert_eq!(credentials.name_id.value, "jdoe");
}

#[test]
fn response_without_any_authn_assertion_is_rejected() {
    let env = TestEnv::new();
    let bare = env.signed(
        Assertion::new(IDP_ENTITY_ID)
            .with_subject(Subject::new(NameId::new("ignored")))
            .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID)),
    );
    let response = env.response_with(bare);

    assert!(matches!(
        env.validator().validate(&response, &env.context()),
        Err(ValidationError::NoSubjectAssertion(_))
    ));
}

#[test]
fn name_id_attribute_takes_precedence_over_the_subject() {
    let env = TestEnv::new();
    let response = env.response();
    let mut context = env.context();
    context.config.name_id_attribute = Some("mail".to_string());

    let credentials = env
        .validator()
        .validate(&response, &context)
        .expect("response validates");
    assert_eq!(credentials.name_id.value, "jdoe@example.com");
}

#[test]
fn required_authn_context_class_ref_must_be_satisfied() {
    let env = TestEnv::new();
    let response = env.response();
    let mut context = env.context();
    context.config = context
        .config
        .require_authn_context_class_ref(AuthnContextClass::TlsClient.uri());

    assert!(matches!(
        env.validator().validate(&response, &context),
        Err(ValidationError::AuthnContextClassRef)
    ));
}

#[test]
fn expired_session_is_rejected() {
    let env = TestEnv::new();
    let assertion = Assertion::new(IDP_ENTITY_ID)
        .with_subject(
            Subject::new(NameId::new("jdoe")).with_confirmation(
                SubjectConfirmation::bearer().with_data(SubjectConfirmationData::for_request(
                    &env.request_id,
                    ACS_URL,
                )),
            ),
        )
        .with_conditions(Conditions::with_validity(5).with_audience(SP_ENTITY_ID))
        .with_authn_statement(
            AuthnStatement::new(AuthnContextClass::PasswordProtectedTransport)
                .with_session_not_on_or_after(Utc::now() - Duration::seconds(1)),
        );
    let response = env.response_with(env.signed(assertion));

    assert!(matches!(
        env.validator().validate(&response, &env.context()),
        Err(ValidationError::AuthnSessionCriteria)
    ));
}

#[test]
fn non_success_status_short_circuits_everything() {
    let env = TestEnv::new();
    let mut response = env.response();
    response.status = sp_saml::types::Status::authn_failed("user cancelled");

    match env.validator().validate(&response, &env.context()) {
        Err(ValidationError::StatusFailure { chain, .. }) => {
            assert!(chain[0].ends_with("Requester"));
        }
        other => panic!("expected StatusFailure, got {other:?}"),
    }
}
