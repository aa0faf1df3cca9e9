//! Process-level tests for `CliEngine`, driven through `sh`.

#![cfg(unix)]

use crate::engine::{
    adapters::CliEngine,
    domain::{EngineConfig, EngineName, EngineStatus, MessageRole, SessionContext},
    ports::EngineAdapter,
};
use eyre::{Result, ensure};
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_stream::StreamExt;

fn sh_engine(script: &str) -> CliEngine {
    CliEngine::new(EngineName::new("sh_engine").expect("valid name"), "sh")
        .with_args(["-c", script])
        .with_health_args(["-c", "exit 0"])
}

/// Prints `echo:<prompt>`; the prompt arrives as `$0`.
fn echo_engine() -> CliEngine {
    sh_engine("printf 'echo:%s' \"$0\"")
}

#[fixture]
fn workdir() -> TempDir {
    tempfile::tempdir().expect("temporary working directory")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_session_records_system_entry_and_activates(workdir: TempDir) -> Result<()> {
    let engine = echo_engine();

    let response = engine.start_session(SessionContext::new(workdir.path())).await;

    ensure!(response.is_success());
    ensure!(engine.status() == EngineStatus::Active);
    let transcript = engine.transcript();
    ensure!(transcript.len() == 1);
    ensure!(transcript[0].role() == MessageRole::System);
    ensure!(transcript[0].content().starts_with("Session started in "));
    ensure!(response.metadata().contains_key("session_id"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn priming_prompt_runs_during_start(workdir: TempDir) -> Result<()> {
    let engine = echo_engine();

    let response = engine
        .start_session(SessionContext::new(workdir.path()).with_initial_prompt("spec body"))
        .await;

    ensure!(response.is_success());
    let contents: Vec<_> = engine
        .transcript()
        .iter()
        .map(|m| m.content().to_owned())
        .collect();
    ensure!(contents[1] == "spec body");
    ensure!(contents[2] == "echo:spec body");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execute_appends_user_and_assistant_turns(workdir: TempDir) -> Result<()> {
    let engine = echo_engine();
    engine.start_session(SessionContext::new(workdir.path())).await;

    let response = engine.execute("plan the work", false).await;

    ensure!(response.is_success(), "execute failed: {:?}", response.error());
    ensure!(response.content() == "echo:plan the work");
    ensure!(response.messages().len() == 2);
    let roles: Vec<_> = engine.transcript().iter().map(|m| m.role()).collect();
    ensure!(roles == vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execute_runs_in_session_directory(workdir: TempDir) -> Result<()> {
    let engine = sh_engine("pwd");
    engine.start_session(SessionContext::new(workdir.path())).await;

    let response = engine.execute("ignored", false).await;

    let reported = std::path::PathBuf::from(response.content().trim()).canonicalize()?;
    ensure!(reported == workdir.path().canonicalize()?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_zero_exit_is_a_failed_response(workdir: TempDir) -> Result<()> {
    let engine = sh_engine("echo oops >&2; exit 4");
    engine.start_session(SessionContext::new(workdir.path())).await;

    let response = engine.execute("anything", false).await;

    ensure!(!response.is_success());
    ensure!(response.error() == Some("oops"));
    ensure!(response.status() == EngineStatus::Error);
    ensure!(response.metadata()["exit_code"] == 4);
    ensure!(engine.status() == EngineStatus::Active, "session survives a failed prompt");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_program_reports_installation_hint(workdir: TempDir) -> Result<()> {
    let engine = CliEngine::new(
        EngineName::new("ghost")?,
        "changeforge-definitely-missing-binary",
    );
    engine.start_session(SessionContext::new(workdir.path())).await;

    let response = engine.execute("hello", false).await;

    ensure!(
        response
            .error()
            .is_some_and(|e| e.contains("not found. Is it installed?")),
        "unexpected error: {:?}",
        response.error()
    );
    ensure!(!engine.health_check().await);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_backend_is_killed_at_the_budget(workdir: TempDir) -> Result<()> {
    let engine = sh_engine("sleep 5").with_timeout(Duration::from_millis(200));
    engine.start_session(SessionContext::new(workdir.path())).await;
    let started = Instant::now();

    let response = engine.execute("wait", false).await;

    ensure!(!response.is_success());
    ensure!(response.error().is_some_and(|e| e.contains("timed out")));
    ensure!(started.elapsed() < Duration::from_secs(4));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn background_child_holding_stdout_cannot_outlive_the_budget(
    workdir: TempDir,
) -> Result<()> {
    let engine = sh_engine("echo started; sleep 6 &").with_timeout(Duration::from_millis(500));
    engine.start_session(SessionContext::new(workdir.path())).await;
    let started = Instant::now();

    let response = engine.execute("wait", false).await;

    ensure!(!response.is_success(), "reply must not wait for the pipe");
    ensure!(response.error().is_some_and(|e| e.contains("timed out")));
    ensure!(started.elapsed() < Duration::from_secs(3));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_session_interrupts_in_flight_prompt(workdir: TempDir) -> Result<()> {
    let engine = Arc::new(sh_engine("sleep 5"));
    engine.start_session(SessionContext::new(workdir.path())).await;
    let started = Instant::now();

    let running = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.execute("long task", false).await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    engine.stop_session().await;
    let response = running.await?;

    ensure!(!response.is_success());
    ensure!(response.status() == EngineStatus::Stopped);
    ensure!(engine.status() == EngineStatus::Stopped);
    ensure!(started.elapsed() < Duration::from_secs(4));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_session_is_idempotent(workdir: TempDir) -> Result<()> {
    let engine = echo_engine();
    engine.start_session(SessionContext::new(workdir.path())).await;

    engine.stop_session().await;
    engine.stop_session().await;

    let terminations = engine
        .transcript()
        .iter()
        .filter(|m| m.content() == "Session terminated")
        .count();
    ensure!(terminations == 1);
    ensure!(engine.status() == EngineStatus::Stopped);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopped_sessions_refuse_prompts(workdir: TempDir) -> Result<()> {
    let engine = echo_engine();
    engine.start_session(SessionContext::new(workdir.path())).await;
    engine.stop_session().await;

    let response = engine.execute("late", false).await;

    ensure!(!response.is_success());
    ensure!(response.error() == Some("Cannot execute in status stopped"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_priming_moves_session_to_error(workdir: TempDir) -> Result<()> {
    let engine = sh_engine("exit 1");

    let response = engine
        .start_session(SessionContext::new(workdir.path()).with_initial_prompt("prime"))
        .await;

    ensure!(!response.is_success());
    ensure!(engine.status() == EngineStatus::Error);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execute_stream_yields_lines_then_records_reply(workdir: TempDir) -> Result<()> {
    let engine = sh_engine("echo first; echo \"$0\"");
    engine.start_session(SessionContext::new(workdir.path())).await;

    let chunks: Vec<String> = engine.execute_stream("second").collect().await;

    ensure!(chunks == vec!["first".to_owned(), "second".to_owned()]);
    let last = engine.transcript().last().cloned();
    ensure!(last.is_some_and(|m| m.role() == MessageRole::Assistant && m.content() == "first\nsecond"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execute_stream_failure_ends_with_error_chunk(workdir: TempDir) -> Result<()> {
    let engine = sh_engine("echo partial; exit 3");
    engine.start_session(SessionContext::new(workdir.path())).await;

    let chunks: Vec<String> = engine.execute_stream("go").collect().await;

    ensure!(chunks.first().map(String::as_str) == Some("partial"));
    ensure!(chunks.last().is_some_and(|c| c.starts_with("Error: ")));
    ensure!(engine.status() == EngineStatus::Error);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execute_with_stream_flag_collects_chunks(workdir: TempDir) -> Result<()> {
    let engine = sh_engine("echo one; echo two");
    engine.start_session(SessionContext::new(workdir.path())).await;

    let response = engine.execute("go", true).await;

    ensure!(response.is_success());
    ensure!(response.content() == "one\ntwo");
    Ok(())
}

#[rstest]
#[case(&["-c", "exit 0"], Duration::from_secs(5), true)]
#[case(&["-c", "exit 1"], Duration::from_secs(5), false)]
#[case(&["-c", "sleep 5"], Duration::from_millis(100), false)]
#[tokio::test(flavor = "multi_thread")]
async fn health_check_never_raises(
    #[case] health_args: &[&str],
    #[case] budget: Duration,
    #[case] expected: bool,
) {
    let engine = CliEngine::new(EngineName::new("checked").expect("valid name"), "sh")
        .with_health_args(health_args.iter().copied())
        .with_health_timeout(budget);

    assert_eq!(engine.health_check().await, expected);
}

#[rstest]
fn copilot_preset_uses_registry_settings(workdir: TempDir) {
    let config = EngineConfig::new()
        .with_working_directory(workdir.path())
        .with_timeout(Duration::from_secs(42));

    let engine = CliEngine::copilot(&config);

    assert_eq!(engine.engine_name(), &EngineName::copilot_cli());
    assert_eq!(engine.status(), EngineStatus::Idle);
}
