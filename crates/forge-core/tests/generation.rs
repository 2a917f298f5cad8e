//! Functional tests for blocking generation, instance sharing and history.
//!
//! - generate_and_save returns the artifact directory and surfaces errors.
//! - Concurrent first requests for one application build one instance.
//! - New instances are hydrated from chat history, oldest first.
//! - Different applications never share directories or memory.

use async_trait::async_trait;
use forge_artifact::{AppId, CodeGenMode, UserId};
use forge_core::{
    ChatHistoryStore, ChatRole, ChatTurn, ForgeError, GenerationRequest, HistoryError,
    InMemoryHistoryStore, MessageRole,
};
use forge_test_utils::{
    sample_multi_file_chunks, sample_single_page_chunks, setup_test_pipeline, ScriptedBackend,
    ScriptedFactory,
};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

mockall::mock! {
    pub History {}

    #[async_trait]
    impl ChatHistoryStore for History {
        async fn load_recent_turns(
            &self,
            app_id: AppId,
            max_count: usize,
        ) -> Result<Vec<ChatTurn>, HistoryError>;

        async fn append(
            &self,
            app_id: AppId,
            text: &str,
            role: ChatRole,
            user_id: UserId,
        ) -> Result<bool, HistoryError>;
    }
}

#[tokio::test]
async fn generate_and_save_single_page() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup_test_pipeline(
        dir.path(),
        Arc::new(ScriptedFactory::new(ScriptedBackend::new(sample_single_page_chunks()))),
        Arc::new(InMemoryHistoryStore::new()),
    );

    let root = pipeline
        .generate_and_save(GenerationRequest::new(AppId(11), "hello", CodeGenMode::SinglePage))
        .await
        .unwrap();

    assert_eq!(root, dir.path().join("html_11"));
    assert_eq!(
        std::fs::read_to_string(root.join("index.html")).unwrap(),
        "<!DOCTYPE html>\n<p>hello</p>\n"
    );
}

#[tokio::test]
async fn generate_and_save_surfaces_backend_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(sample_multi_file_chunks()).failing_at(1, "connection reset");
    let pipeline = setup_test_pipeline(
        dir.path(),
        Arc::new(ScriptedFactory::new(backend)),
        Arc::new(InMemoryHistoryStore::new()),
    );

    let err = pipeline
        .generate_and_save(GenerationRequest::new(AppId(1), "x", CodeGenMode::MultiFile))
        .await
        .unwrap_err();

    assert!(matches!(err, ForgeError::Backend(_)));
    assert!(!dir.path().join("multi_file_1").exists());
}

#[tokio::test]
async fn repeated_generation_overwrites_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup_test_pipeline(
        dir.path(),
        Arc::new(ScriptedFactory::new(ScriptedBackend::new(sample_multi_file_chunks()))),
        Arc::new(InMemoryHistoryStore::new()),
    );
    let request = GenerationRequest::new(AppId(2), "page", CodeGenMode::MultiFile);

    let first = pipeline.generate_and_save(request.clone()).await.unwrap();
    let second = pipeline.generate_and_save(request).await.unwrap();

    assert_eq!(first, second);
    let mut names: Vec<String> = std::fs::read_dir(&second)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["index.html", "style.css"]);
}

/// Two first-time requests for one application race on the pool; exactly one
/// instance is built and both see the same hydrated memory.
#[tokio::test]
async fn concurrent_first_requests_share_one_instance() {
    let dir = tempfile::tempdir().unwrap();
    let history = Arc::new(InMemoryHistoryStore::new());
    history.seed(AppId(5), vec![ChatTurn::user("earlier prompt"), ChatTurn::assistant("earlier reply")]);
    let factory = Arc::new(
        ScriptedFactory::new(ScriptedBackend::new(sample_multi_file_chunks()))
            .with_delay(Duration::from_millis(50)),
    );
    let pipeline = setup_test_pipeline(dir.path(), factory.clone(), history);

    let a = pipeline.pool().get_instance(AppId(5));
    let b = pipeline.pool().get_instance(AppId(5));
    let (a, b) = tokio::join!(a, b);
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(factory.builds(), 1);
    assert_eq!(pipeline.pool().stats().await.instances_created, 1);

    let memory = a.memory_snapshot().await;
    assert_eq!(memory.len(), 2);
    assert_eq!(memory[0].text, "earlier prompt");
}

/// The backend sees the system prompt, the hydrated history, then the prompt.
#[tokio::test]
async fn hydrated_history_is_sent_to_backend() {
    let dir = tempfile::tempdir().unwrap();
    let history = Arc::new(InMemoryHistoryStore::new());
    history.seed(AppId(7), vec![ChatTurn::user("blue page"), ChatTurn::assistant("```html\n<p></p>\n```\n")]);
    let factory = Arc::new(ScriptedFactory::new(ScriptedBackend::new(sample_multi_file_chunks())));
    let pipeline = setup_test_pipeline(dir.path(), factory.clone(), history);

    pipeline
        .generate_and_save(GenerationRequest::new(AppId(7), "now make it red", CodeGenMode::MultiFile))
        .await
        .unwrap();

    let calls = factory.backend().calls();
    assert_eq!(calls.len(), 1);
    let roles: Vec<MessageRole> = calls[0].iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::System, MessageRole::User, MessageRole::Assistant, MessageRole::User]
    );
    assert_eq!(calls[0][1].content, "blue page");
    assert_eq!(calls[0][3].content, "now make it red");
}

/// Requests for different applications land in separate directories.
#[tokio::test]
async fn applications_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup_test_pipeline(
        dir.path(),
        Arc::new(ScriptedFactory::new(ScriptedBackend::new(sample_multi_file_chunks()))),
        Arc::new(InMemoryHistoryStore::new()),
    );

    let (a, b) = tokio::join!(
        pipeline.generate_and_save(GenerationRequest::new(AppId(1), "a", CodeGenMode::MultiFile)),
        pipeline.generate_and_save(GenerationRequest::new(AppId(2), "b", CodeGenMode::MultiFile)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a, b);
    assert!(a.join("index.html").exists());
    assert!(b.join("index.html").exists());

    let first = pipeline.pool().get_instance(AppId(1)).await.unwrap();
    let memory = first.memory_snapshot().await;
    assert!(memory.iter().all(|turn| turn.text != "b"));
}

/// History writes go through the store with the request's principal.
#[tokio::test]
async fn history_store_receives_prompt_and_reply() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = MockHistory::new();
    history
        .expect_load_recent_turns()
        .with(eq(AppId(3)), eq(20))
        .times(1)
        .returning(|_, _| Ok(Vec::new()));
    history
        .expect_append()
        .withf(|app_id, text, role, user_id| {
            *app_id == AppId(3)
                && *role == ChatRole::User
                && *user_id == UserId(8)
                && text.contains("make it")
        })
        .times(1)
        .returning(|_, _, _, _| Ok(true));
    history
        .expect_append()
        .withf(|app_id, text, role, _| {
            *app_id == AppId(3) && *role == ChatRole::Assistant && text.contains("<h1>Hi</h1>")
        })
        .times(1)
        .returning(|_, _, _, _| Ok(true));

    let pipeline = setup_test_pipeline(
        dir.path(),
        Arc::new(ScriptedFactory::new(ScriptedBackend::new(sample_multi_file_chunks()))),
        Arc::new(history),
    );

    let request = GenerationRequest::new(AppId(3), "make it", CodeGenMode::MultiFile).with_user(UserId(8));
    pipeline.generate_and_save(request).await.unwrap();
}

/// A failing history store never blocks generation.
#[tokio::test]
async fn history_failures_are_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = MockHistory::new();
    history
        .expect_load_recent_turns()
        .returning(|_, _| Err(HistoryError::Invalid("unavailable".into())));
    history
        .expect_append()
        .returning(|_, _, _, _| Err(HistoryError::Invalid("unavailable".into())));

    let pipeline = setup_test_pipeline(
        dir.path(),
        Arc::new(ScriptedFactory::new(ScriptedBackend::new(sample_multi_file_chunks()))),
        Arc::new(history),
    );

    let request = GenerationRequest::new(AppId(4), "page", CodeGenMode::MultiFile).with_user(UserId(1));
    let root = pipeline.generate_and_save(request).await.unwrap();

    assert!(root.join("style.css").exists());
}
