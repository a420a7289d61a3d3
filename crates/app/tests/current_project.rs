//! Current-project isolation across concurrent tasks, sessions, and access records.

mod common;

use common::{CONFIG_JSON, FakeRemote, TestResult, engine, write_project};
use confhub_adapters::{JsonLinesAccessLog, LocalConfigStore, MemoryLogSink};
use confhub_app::{ConfigEngine, EngineDeps, EngineOptions, ProjectScope, current_project};
use confhub_domain::ConfigError;
use confhub_shared::RequestContext;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Barrier;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_observe_only_their_own_project() -> TestResult {
    let root = tempfile::tempdir()?;
    let engine = engine(Arc::new(FakeRemote::failing()), EngineOptions::default());
    let tasks = 8;
    let barrier = Arc::new(Barrier::new(tasks));

    let mut handles = Vec::new();
    for index in 0..tasks {
        let name = format!("project{index}");
        let dir = write_project(
            root.path(),
            &name,
            &format!("[key]\nname = {name}\n"),
            CONFIG_JSON,
        )?;
        let engine = engine.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::new_request();
            let (seen, again) = engine
                .with_current_project(&ctx, &dir, async {
                    barrier.wait().await;
                    let seen = engine.resolve(&ctx, None, "name", Value::Null).await?;
                    tokio::task::yield_now().await;
                    let again = engine.resolve(&ctx, None, "system.name", Value::Null).await?;
                    Ok::<_, ConfigError>((seen, again))
                })
                .await??;
            Ok::<_, ConfigError>((name, seen, again))
        }));
    }

    for handle in handles {
        let (name, seen, again) = handle.await??;
        assert_eq!(seen, json!(name));
        assert_eq!(again, json!(name));
    }
    assert_eq!(current_project(), None);
    Ok(())
}

#[tokio::test]
async fn explicit_project_overrides_the_current_one() -> TestResult {
    let root = tempfile::tempdir()?;
    let alpha = write_project(root.path(), "alpha", "[key]\nname = alpha\n", CONFIG_JSON)?;
    let beta = write_project(root.path(), "beta", "[key]\nname = beta\n", CONFIG_JSON)?;
    let engine = engine(Arc::new(FakeRemote::failing()), EngineOptions::default());
    let ctx = RequestContext::new_request();

    let (implicit, explicit) = engine
        .with_current_project(&ctx, &alpha, async {
            let implicit = engine.resolve(&ctx, None, "name", Value::Null).await?;
            let explicit = engine
                .resolve(&ctx, Some(beta.as_path()), "name", Value::Null)
                .await?;
            Ok::<_, ConfigError>((implicit, explicit))
        })
        .await??;
    assert_eq!(implicit, json!("alpha"));
    assert_eq!(explicit, json!("beta"));
    Ok(())
}

#[tokio::test]
async fn entering_a_project_loads_it_first() -> TestResult {
    let root = tempfile::tempdir()?;
    let dir = write_project(root.path(), "fay", "[key]\nname = fay\n", CONFIG_JSON)?;
    let empty = root.path().join("empty");
    std::fs::create_dir_all(&empty)?;
    let engine = engine(Arc::new(FakeRemote::failing()), EngineOptions::default());
    let ctx = RequestContext::new_request();

    let cached = engine
        .with_current_project(&ctx, &dir, async {
            engine.loader().cache().get(&ProjectScope::dir(&dir)).await.is_some()
        })
        .await?;
    assert!(cached);

    let ran = AtomicBool::new(false);
    let error = engine
        .with_current_project(&ctx, &empty, async {
            ran.store(true, Ordering::SeqCst);
        })
        .await
        .err();
    assert!(matches!(error, Some(ConfigError::ConfigUnavailable { .. })));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(current_project(), None);
    Ok(())
}

#[tokio::test]
async fn without_a_current_project_the_global_scope_is_used() -> TestResult {
    let root = tempfile::tempdir()?;
    let global = write_project(root.path(), "global", "[key]\nname = global\n", CONFIG_JSON)?;
    let options = EngineOptions {
        default_dir: global,
        ..EngineOptions::default()
    };
    let engine = engine(Arc::new(FakeRemote::failing()), options);
    let ctx = RequestContext::new_request();

    assert_eq!(
        engine.resolve(&ctx, None, "name", Value::Null).await?,
        json!("global")
    );
    assert!(
        engine
            .loader()
            .cache()
            .get(&ProjectScope::Global)
            .await
            .is_some()
    );
    Ok(())
}

#[tokio::test]
async fn sessions_keep_their_pinned_snapshot() -> TestResult {
    let root = tempfile::tempdir()?;
    let dir = write_project(root.path(), "fay", "[key]\nname = before\n", CONFIG_JSON)?;
    let engine = engine(Arc::new(FakeRemote::failing()), EngineOptions::default());
    let ctx = RequestContext::new_request();

    let session = engine.open_session(&ctx, Some(dir.as_path())).await?;
    engine
        .set_value(&ctx, Some(dir.as_path()), "system.key.name", "after")
        .await?;

    assert_eq!(session.resolve("name", Value::Null), json!("before"));
    assert_eq!(session.scope(), &ProjectScope::dir(&dir));
    assert_eq!(
        engine
            .resolve(&ctx, Some(dir.as_path()), "name", Value::Null)
            .await?,
        json!("after")
    );
    Ok(())
}

#[tokio::test]
async fn access_records_follow_each_call() -> TestResult {
    let root = tempfile::tempdir()?;
    let dir = write_project(root.path(), "fay", "[key]\nname = fay\n", CONFIG_JSON)?;
    let sink = Arc::new(MemoryLogSink::default());
    let deps = EngineDeps::new(
        Arc::new(LocalConfigStore::new()),
        Arc::new(FakeRemote::failing()),
    )
    .with_access_log(Arc::new(JsonLinesAccessLog::new(sink.clone())));
    let engine = ConfigEngine::new(deps, EngineOptions::default());
    let ctx = RequestContext::new_request();
    let project = Some(dir.as_path());

    engine.resolve(&ctx, project, "name", Value::Null).await?;
    engine
        .resolve(&ctx, project, "config.missing", Value::Null)
        .await?;
    engine.set_value(&ctx, project, "config.a.b", "1").await?;
    let _ = engine.delete_value(&ctx, project, "config.nope").await;

    let records: Vec<Value> = sink
        .take()
        .iter()
        .map(|line| serde_json::from_str(line.trim()))
        .collect::<Result<_, _>>()?;
    let summary: Vec<(String, String, String)> = records
        .iter()
        .map(|record| {
            let field = |name: &str| {
                record
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned()
            };
            (field("operation"), field("keyPath"), field("outcome"))
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("resolve".into(), "name".into(), "hit".into()),
            ("resolve".into(), "config.missing".into(), "default".into()),
            ("set".into(), "config.a.b".into(), "ok".into()),
            ("delete".into(), "config.nope".into(), "config:not_found".into()),
        ]
    );
    assert!(
        records
            .iter()
            .all(|record| record.get("projectId") == Some(&json!("fay")))
    );
    Ok(())
}
