use super::*;
use crate::log_sink::LogLevel;
use marionette_llm::{LlmProvider, MockProvider, ProviderKind};
use marionette_tools::{
    register_builtins, ActionStatus, BuiltinsConfig, DriverEvent, MouseButton, RecordingDriver,
    RunnerConfig, Workspace,
};
use std::sync::Mutex as StdMutex;

/// Hands out one shared mock and remembers the configs it was asked for
#[derive(Clone, Default)]
struct RecordingFactory {
    mock: MockProvider,
    configs: Arc<StdMutex<Vec<ProviderConfig>>>,
}

impl ProviderFactory for RecordingFactory {
    fn build(&self, config: &ProviderConfig) -> marionette_llm::Result<Arc<dyn LlmProvider>> {
        self.configs.lock().unwrap().push(config.clone());
        Ok(Arc::new(self.mock.clone()))
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    driver: Arc<RecordingDriver>,
    factory: RecordingFactory,
    engine: Arc<Engine>,
}

/// Records saved models, or fails every save
#[derive(Default)]
struct RecordingPersister {
    saved: StdMutex<Vec<String>>,
    fail: bool,
}

impl ConfigPersister for RecordingPersister {
    fn save(&self, config: &ProviderConfig) -> Result<()> {
        if self.fail {
            return Err(Error::Persist("disk full".to_string()));
        }
        // widen the window between commit and write
        std::thread::sleep(Duration::from_millis(2));
        self.saved.lock().unwrap().push(config.model.clone());
        Ok(())
    }
}

fn harness() -> Harness {
    build_harness(None)
}

fn build_harness(persister: Option<Arc<dyn ConfigPersister>>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let driver = Arc::new(RecordingDriver::new(1920, 1080));
    let mut registry = ActionRegistry::new();
    register_builtins(
        &mut registry,
        &BuiltinsConfig {
            driver: driver.clone(),
            workspace: Arc::new(Workspace::new(dir.path().join("workspace")).unwrap()),
        },
    );
    let runner = ActionRunner::new(
        Arc::new(registry),
        RunnerConfig::default().with_interval(Duration::ZERO),
    );

    let factory = RecordingFactory::default();
    let engine = Engine::new(
        runner,
        EngineConfig::default(),
        Arc::new(LogSink::new()),
        Arc::new(ConfigStore::default()),
    )
    .with_provider_factory(Arc::new(factory.clone()));
    let engine = match persister {
        Some(persister) => engine.with_config_persister(persister),
        None => engine,
    };

    Harness {
        _dir: dir,
        driver,
        factory,
        engine: Arc::new(engine),
    }
}

fn chat(response: SubmitResponse) -> ChatResult {
    match response {
        SubmitResponse::Chat(result) => result,
        SubmitResponse::Terminal(out) => panic!("expected chat result, got {out:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_escape_never_reaches_provider() {
    let h = harness();

    let response = h.engine.submit("!echo hi").await.unwrap();
    let SubmitResponse::Terminal(out) = response else {
        panic!("expected terminal output");
    };
    assert_eq!(out.output.as_deref(), Some("hi"));
    assert_eq!(out.status, ActionStatus::Ok);

    assert!(h.factory.configs.lock().unwrap().is_empty());
    assert!(h.factory.mock.requests().is_empty());
    assert!(h.driver.events().is_empty());

    let levels: Vec<LogLevel> = h.engine.log().snapshot().iter().map(|e| e.level).collect();
    assert_eq!(levels, vec![LogLevel::User, LogLevel::Terminal]);
}

#[tokio::test]
async fn test_unknown_action_is_a_result_not_a_failure() {
    let h = harness();
    h.factory.mock.push_response(
        r#"{"intent":"Open browser","actions":[{"type":"browser.open","params":{}}]}"#,
    );

    let result = chat(h.engine.submit("open browser").await.unwrap());
    assert_eq!(result.status, ActionStatus::Ok);
    let results = result.results.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ActionStatus::Error);
    assert_eq!(results[0].message.as_deref(), Some("unknown action"));
}

#[tokio::test]
async fn test_auth_failure_produces_no_results() {
    let h = harness();
    h.factory
        .mock
        .push_error(marionette_llm::Error::Auth("openai returned HTTP 401".to_string()));

    let result = chat(h.engine.submit("click the button").await.unwrap());
    assert_eq!(result.status, ActionStatus::Error);
    assert!(result.results.is_none());
    assert!(result.message.unwrap().contains("authentication failed"));
    assert!(h.driver.events().is_empty());
}

#[tokio::test]
async fn test_failed_step_does_not_stop_later_steps() {
    let h = harness();
    h.factory.mock.push_response(
        r#"{"intent":"Three steps","actions":[
            {"type":"mouse.move","params":{"x":10,"y":20}},
            {"type":"mouse.move","params":{"x":5000,"y":20}},
            {"type":"mouse.click","params":{"button":"right"}}
        ]}"#,
    );

    let result = chat(h.engine.submit("do three things").await.unwrap());
    let results = result.results.unwrap();
    let statuses: Vec<ActionStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![ActionStatus::Ok, ActionStatus::Error, ActionStatus::Ok]
    );
    assert!(results[1].message.as_deref().unwrap().contains("out of bounds"));

    assert_eq!(
        h.driver.events(),
        vec![
            DriverEvent::Move { x: 10, y: 20 },
            DriverEvent::Click {
                button: MouseButton::Right,
                clicks: 1
            },
        ]
    );
}

#[tokio::test]
async fn test_update_config_then_call_uses_new_record() {
    let h = harness();
    let config = h
        .engine
        .update_config(
            ProviderSettings::new("anthropic")
                .with_api_key("sk-ant-test")
                .with_model("claude-3-5-haiku-latest"),
        )
        .await
        .unwrap();

    h.engine.chat("what is this machine").await.unwrap();

    let seen = h.factory.configs.lock().unwrap().clone();
    assert_eq!(seen, vec![(*config).clone()]);
    assert_eq!(seen[0].provider, ProviderKind::Anthropic);
    assert_eq!(seen[0].model, "claude-3-5-haiku-latest");
}

#[tokio::test]
async fn test_rejected_config_keeps_previous_and_logs() {
    let h = harness();
    let err = h
        .engine
        .update_config(ProviderSettings::new("http"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(h.engine.provider_config().provider, ProviderKind::Mock);
    assert_eq!(h.engine.log().snapshot()[0].level, LogLevel::Error);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_saved_configs_follow_commit_order() {
    let persister = Arc::new(RecordingPersister::default());
    let h = build_harness(Some(persister.clone()));

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine
                    .update_config(ProviderSettings::new("local").with_model(format!("model-{i}")))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let saved = persister.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 16);
    let committed: Vec<String> = h
        .engine
        .log()
        .snapshot()
        .into_iter()
        .filter(|e| e.level == LogLevel::System)
        .map(|e| e.message)
        .collect();
    let expected: Vec<String> = saved
        .iter()
        .map(|model| format!("Provider configured: local ({model})"))
        .collect();
    assert_eq!(committed, expected);
    assert_eq!(saved.last(), Some(&h.engine.provider_config().model));
}

#[tokio::test]
async fn test_failed_save_keeps_update_and_logs() {
    let persister = Arc::new(RecordingPersister {
        fail: true,
        ..Default::default()
    });
    let h = build_harness(Some(persister));

    let config = h
        .engine
        .update_config(ProviderSettings::new("local"))
        .await
        .unwrap();
    assert_eq!(h.engine.provider_config(), config);

    let last = h.engine.log().snapshot().pop().unwrap();
    assert_eq!(last.level, LogLevel::Error);
    assert_eq!(
        last.message,
        "Failed to save provider config: persistence error: disk full"
    );
}

#[tokio::test]
async fn test_empty_input_has_no_side_effects() {
    let h = harness();
    for input in ["", "   ", "!", "! "] {
        assert!(matches!(h.engine.submit(input).await, Err(Error::EmptyInput)));
    }
    assert!(matches!(h.engine.chat(" ").await, Err(Error::EmptyInput)));
    assert!(matches!(h.engine.terminal("").await, Err(Error::EmptyInput)));

    assert!(h.engine.log().is_empty());
    assert!(h.factory.configs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_execute_action_directly() {
    let h = harness();
    let result = h
        .engine
        .execute_action(&Intent::new("system.screen_size"))
        .await;
    assert!(result.is_ok());
    assert_eq!(result.output.unwrap()["width"], 1920);

    let entries = h.engine.log().snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Ok);
    assert!(entries[0].message.starts_with("ACTION: system.screen_size"));
}

#[tokio::test]
async fn test_execute_batch_directly() {
    let h = harness();
    let results = h
        .engine
        .execute_batch(&[
            Intent::new("mouse.position"),
            Intent::new("nope"),
            Intent::new("keyboard.type").with_param("text", "hi"),
        ])
        .await;
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(!results[1].is_ok());
    assert!(results[2].is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_do_not_interleave() {
    let h = harness();
    for _ in 0..8 {
        h.factory.mock.push_response(
            r#"{"intent":"Where","actions":[{"type":"mouse.position"}]}"#,
        );
    }

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.submit(&format!("instruction {i}")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let levels: Vec<LogLevel> = h.engine.log().snapshot().iter().map(|e| e.level).collect();
    assert_eq!(levels.len(), 24);
    for chunk in levels.chunks(3) {
        assert_eq!(chunk, [LogLevel::User, LogLevel::Ai, LogLevel::Ok]);
    }
}

#[test]
fn test_system_prompt_lists_catalog() {
    let h = harness();
    assert!(h.engine.system_prompt().contains("keyboard.hotkey"));
    assert_eq!(h.engine.registry().len(), 17);
}

#[test]
fn test_submit_response_is_untagged() {
    let value = serde_json::to_value(SubmitResponse::Chat(ChatResult::failed("x"))).unwrap();
    assert_eq!(value, serde_json::json!({"status": "error", "message": "x"}));
}
