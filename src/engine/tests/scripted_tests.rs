//! Behaviour tests for the in-memory `ScriptedEngine`.

use crate::engine::{
    adapters::ScriptedEngine,
    domain::{EngineName, EngineStatus, SessionContext},
    ports::EngineAdapter,
};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use std::sync::Arc;
use tokio_stream::StreamExt;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[fixture]
fn name() -> EngineName {
    EngineName::new("scripted").expect("valid name")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replies_are_consumed_in_order(name: EngineName) {
    let engine = ScriptedEngine::new(name).with_reply("first").with_reply("second");
    engine.start_session(SessionContext::new("/work")).await;

    let one = engine.execute("a", false).await;
    let two = engine.execute("b", false).await;
    let three = engine.execute("c", false).await;

    assert_eq!(one.content(), "first");
    assert_eq!(two.content(), "second");
    assert!(!three.is_success());
    assert_eq!(engine.prompts(), vec!["a", "b", "c"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn queued_failures_fail_priming(name: EngineName) {
    let engine = ScriptedEngine::new(name).with_failure("backend exploded");

    let response = engine
        .start_session(SessionContext::new("/work").with_initial_prompt("prime"))
        .await;

    assert!(!response.is_success());
    assert_eq!(response.error(), Some("backend exploded"));
    assert_eq!(engine.status(), EngineStatus::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn feedback_is_forwarded_as_a_prompt(name: EngineName) {
    let engine = ScriptedEngine::new(name).with_reply("revised");
    engine.start_session(SessionContext::new("/work")).await;

    let response = engine.send_feedback("msg-1", "please add tests").await;

    assert_eq!(response.content(), "revised");
    assert_eq!(engine.prompts(), vec!["please add tests"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn streams_split_replies_into_lines(name: EngineName) {
    let engine = ScriptedEngine::new(name).with_reply("l1\nl2");
    engine.start_session(SessionContext::new("/work")).await;

    let chunks: Vec<String> = engine.execute_stream("go").collect().await;

    assert_eq!(chunks, vec!["l1", "l2"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_is_configurable(name: EngineName) {
    let engine = ScriptedEngine::new(name).with_healthy(false);

    assert!(!engine.health_check().await);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn session_ids_and_transcripts_follow_the_injected_clock(name: EngineName) {
    let instant = Utc
        .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
        .single()
        .expect("valid instant");
    let engine = ScriptedEngine::new(name)
        .with_clock(Arc::new(FixedClock(instant)))
        .with_reply("ok");

    let started = engine.start_session(SessionContext::new("/work")).await;
    engine.execute("go", false).await;
    engine.stop_session().await;

    assert_eq!(
        started.metadata().get("session_id").and_then(serde_json::Value::as_str),
        Some("session_20240309_140507")
    );
    let transcript = engine.transcript();
    assert_eq!(transcript.len(), 4);
    assert!(transcript.iter().all(|message| message.timestamp() == instant));
}
