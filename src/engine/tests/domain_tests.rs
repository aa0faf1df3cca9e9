//! Validation tests for engine domain values.

use crate::engine::domain::{
    EngineDomainError, EngineExecutionError, EngineMessage, EngineName, EngineResponse,
    EngineStatus, MessageRole, ParseEngineStatusError,
};
use chrono::Utc;
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[case("copilot_cli", "copilot_cli")]
#[case("  Scripted  ", "scripted")]
#[case("engine_2", "engine_2")]
fn engine_names_are_normalized(#[case] raw: &str, #[case] expected: &str) {
    let name = EngineName::new(raw).expect("valid engine name");

    assert_eq!(name.as_str(), expected);
}

#[rstest]
#[case("", EngineDomainError::EmptyEngineName)]
#[case("   ", EngineDomainError::EmptyEngineName)]
#[case("copilot-cli", EngineDomainError::InvalidEngineName("copilot-cli".to_owned()))]
#[case("a b", EngineDomainError::InvalidEngineName("a b".to_owned()))]
fn invalid_engine_names_are_rejected(#[case] raw: &str, #[case] expected: EngineDomainError) {
    assert_eq!(EngineName::new(raw), Err(expected));
}

#[rstest]
fn overlong_engine_names_are_rejected() {
    let raw = "a".repeat(101);

    assert!(matches!(
        EngineName::new(raw),
        Err(EngineDomainError::EngineNameTooLong(_))
    ));
    assert!(EngineName::new("a".repeat(100)).is_ok());
}

#[rstest]
fn engine_names_deserialize_through_validation() {
    let parsed: Result<EngineName, _> = serde_json::from_str("\"not valid!\"");

    assert!(parsed.is_err());
    assert_eq!(
        serde_json::from_str::<EngineName>("\"copilot_cli\"").expect("valid name"),
        EngineName::copilot_cli()
    );
}

#[rstest]
#[case(EngineStatus::Idle, true)]
#[case(EngineStatus::Active, true)]
#[case(EngineStatus::Error, false)]
#[case(EngineStatus::Stopped, false)]
fn only_idle_and_active_accept_prompts(#[case] status: EngineStatus, #[case] expected: bool) {
    assert_eq!(status.accepts_prompts(), expected);
    assert_eq!(EngineStatus::try_from(status.as_str()), Ok(status));
}

#[rstest]
#[case(" Error ", Ok(EngineStatus::Error))]
#[case("STOPPED", Ok(EngineStatus::Stopped))]
#[case("crashed", Err(ParseEngineStatusError("crashed".to_owned())))]
fn statuses_parse_case_insensitively(
    #[case] text: &str,
    #[case] expected: Result<EngineStatus, ParseEngineStatusError>,
) {
    assert_eq!(EngineStatus::try_from(text), expected);
}

#[rstest]
fn execution_errors_render_operator_messages() {
    assert_eq!(
        EngineExecutionError::NotFound("copilot".to_owned()).to_string(),
        "copilot not found. Is it installed?"
    );
    assert_eq!(
        EngineExecutionError::Timeout(Duration::from_secs(300)).to_string(),
        "Command timed out after 300s"
    );
}

#[rstest]
fn failed_responses_carry_error_and_status() {
    let response = EngineResponse::failure("boom", EngineStatus::Error).with_metadata("exit_code", 2);

    assert!(!response.is_success());
    assert_eq!(response.error(), Some("boom"));
    assert_eq!(response.status(), EngineStatus::Error);
    assert_eq!(response.metadata()["exit_code"], 2);
}

#[rstest]
fn messages_serialize_with_lowercase_roles() {
    let message = EngineMessage::new(MessageRole::Assistant, "done", Utc::now());

    let value = serde_json::to_value(&message).expect("serialize message");

    assert_eq!(value["role"], "assistant");
    assert_eq!(message.role(), MessageRole::Assistant);
    assert!(value.get("metadata").is_none());
}
