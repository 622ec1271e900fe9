// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default configuration, shared default worker, and one-shot writes.

use std::path::Path;

use keeper_core::{KeeperError, LocatableConfig, WorkerState};
use keeper_test_utils::{MockConfig, MockResource, Recorder};
use keeper_worker::Keeper;

#[tokio::test]
async fn default_worker_without_configuration_fails() {
    let keeper: Keeper<MockResource> = Keeper::new();
    let result = keeper.transact(|_| Ok(())).await;
    assert!(matches!(result, Err(KeeperError::NoConfiguration)));
}

#[tokio::test]
async fn default_worker_is_shared_and_lazily_spawned() {
    let recorder = Recorder::new();
    let keeper = Keeper::<MockResource>::with_default_config(MockConfig::with_recorder(recorder.clone()));
    assert_eq!(recorder.snapshot().opens, 0);

    keeper
        .transact(|r: &mut MockResource| {
            r.push(1);
            Ok(())
        })
        .await
        .unwrap();
    keeper
        .transact(|r: &mut MockResource| {
            r.push(2);
            Ok(())
        })
        .await
        .unwrap();

    let first = keeper.default_worker().unwrap();
    let second = keeper.default_worker().unwrap();
    assert_eq!(first.id(), second.id());
    assert_eq!(recorder.snapshot().opens, 1);
    assert_eq!(recorder.snapshot().committed, vec![1, 2]);

    keeper.close_default_worker().await.unwrap();
    assert_eq!(first.state(), WorkerState::Disposed);
    assert_ne!(keeper.default_worker().unwrap().id(), first.id());
}

#[tokio::test]
async fn setting_a_default_replaces_the_unconfigured_worker() {
    let keeper: Keeper<MockResource> = Keeper::new();
    let unconfigured = keeper.default_worker().unwrap();
    assert!(matches!(
        unconfigured.ready().await,
        Err(KeeperError::NoConfiguration)
    ));

    // Set directly on the holder: the stale worker is noticed lazily.
    keeper.defaults().set(Some(MockConfig::default()));
    let configured = keeper.default_worker().unwrap();
    assert_ne!(configured.id(), unconfigured.id());
    configured.ready().await.unwrap();
    assert!(keeper.transact(|_| Ok(())).await.is_ok());
}

#[tokio::test]
async fn changing_the_default_reopens_the_default_worker() {
    let first_recorder = Recorder::new();
    let keeper =
        Keeper::<MockResource>::with_default_config(MockConfig::with_recorder(first_recorder.clone()));
    keeper.transact(|_| Ok(())).await.unwrap();
    let first = keeper.default_worker().unwrap();

    let second_recorder = Recorder::new();
    keeper.set_default_config(Some(MockConfig::with_recorder(second_recorder.clone())));
    keeper.transact(|_| Ok(())).await.unwrap();

    assert_ne!(keeper.default_worker().unwrap().id(), first.id());
    assert_eq!(first_recorder.snapshot().opens, 1);
    assert_eq!(second_recorder.snapshot().opens, 1);
    assert_eq!(keeper.default_config(), Some(MockConfig::with_recorder(second_recorder)));
}

#[tokio::test]
async fn submit_reports_through_callback() {
    let keeper = Keeper::<MockResource>::with_default_config(MockConfig::default());
    let (tx, rx) = tokio::sync::oneshot::channel();
    keeper.submit(
        |r: &mut MockResource| {
            r.push(5);
            Ok(r.records().to_vec())
        },
        move |result| {
            let _ = tx.send(result);
        },
    );
    assert_eq!(rx.await.unwrap().unwrap(), vec![5]);
}

#[tokio::test]
async fn spawn_at_replaces_the_default_location() {
    let keeper = Keeper::<MockResource>::with_default_config(MockConfig {
        seed: vec![1],
        ..MockConfig::default()
    });
    let worker = keeper.spawn_at("/srv/keeper/a.db", |_| {}).unwrap();
    worker.ready().await.unwrap();

    let config = worker.configuration().unwrap();
    assert_eq!(config.location(), Some(Path::new("/srv/keeper/a.db")));
    assert_eq!(config.seed, vec![1]);
    assert!(!worker.is_empty().await.unwrap());
    worker.close().await.unwrap();
}

#[tokio::test]
async fn spawn_at_without_default_uses_default_config() {
    let keeper: Keeper<MockResource> = Keeper::new();
    let worker = keeper.spawn_at("/srv/keeper/b.db", |_| {}).unwrap();
    worker.ready().await.unwrap();
    assert_eq!(
        worker.configuration().and_then(|c| c.location),
        Some("/srv/keeper/b.db".into())
    );
    assert!(worker.is_empty().await.unwrap());
    worker.close().await.unwrap();
}

#[tokio::test]
async fn spawn_default_uses_the_holder() {
    let keeper = Keeper::<MockResource>::with_default_config(MockConfig {
        seed: vec![3],
        ..MockConfig::default()
    });
    let worker = keeper.spawn_default(|_| {}).unwrap();
    assert!(!worker.is_empty().await.unwrap());
    assert_ne!(worker.id(), keeper.default_worker().unwrap().id());
    worker.close().await.unwrap();
}

#[tokio::test]
async fn write_once_runs_then_closes() {
    let recorder = Recorder::new();
    let keeper = Keeper::<MockResource>::with_default_config(MockConfig::with_recorder(recorder.clone()));

    let len = keeper
        .write_once(None, |r: &mut MockResource| {
            r.push(9);
            Ok(r.records().len())
        })
        .await
        .unwrap();
    assert_eq!(len, 1);

    let log = recorder.snapshot();
    assert_eq!(log.committed, vec![9]);
    assert_eq!(log.opens, 1);
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn write_once_reports_task_error_over_close_error() {
    let keeper: Keeper<MockResource> = Keeper::new();
    let config = MockConfig {
        fail_close: true,
        ..MockConfig::default()
    };

    let result: Result<(), _> = keeper
        .write_once(Some(config.clone()), |_| Err("task failed".into()))
        .await;
    match result {
        Err(KeeperError::Generic { source }) => assert_eq!(source.to_string(), "task failed"),
        other => panic!("expected task error, got {other:?}"),
    }

    let result = keeper.write_once(Some(config), |_| Ok(())).await;
    match result {
        Err(KeeperError::Generic { source }) => assert_eq!(source.to_string(), "mock close failed"),
        other => panic!("expected close error, got {other:?}"),
    }
}

#[tokio::test]
async fn write_once_without_configuration_fails() {
    let keeper: Keeper<MockResource> = Keeper::new();
    let result = keeper.write_once(None, |_| Ok(())).await;
    assert!(matches!(result, Err(KeeperError::NoConfiguration)));
}

#[tokio::test]
async fn write_once_at_uses_the_default_with_a_new_location() {
    let recorder = Recorder::new();
    let keeper = Keeper::<MockResource>::with_default_config(MockConfig {
        seed: vec![4],
        recorder: recorder.clone(),
        ..MockConfig::default()
    });

    let (location, records) = keeper
        .write_once_at("/srv/keeper/c.db", |r: &mut MockResource| {
            r.push(5);
            Ok((r.config().location.clone(), r.records().to_vec()))
        })
        .await
        .unwrap();
    assert_eq!(location, Some("/srv/keeper/c.db".into()));
    assert_eq!(records, vec![4, 5]);

    let log = recorder.snapshot();
    assert_eq!(log.committed, vec![5]);
    assert_eq!((log.opens, log.closes), (1, 1));
    assert_eq!(keeper.default_config().and_then(|c| c.location), None);
}

#[tokio::test]
async fn write_once_at_without_default_uses_default_config() {
    let keeper: Keeper<MockResource> = Keeper::new();
    let location = keeper
        .write_once_at("/srv/keeper/d.db", |r: &mut MockResource| {
            Ok(r.config().location.clone())
        })
        .await
        .unwrap();
    assert_eq!(location, Some("/srv/keeper/d.db".into()));
}
