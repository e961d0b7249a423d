//! Drives a real `notify` watcher against a tempdir to verify debouncing
//! and the atomic-save-produces-no-spurious-delete guarantee end to end.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use taskorc::domain::errors::DomainResult;
use taskorc::domain::models::config::Config;
use taskorc::domain::models::{Phase, Weight};
use taskorc::domain::ports::PlanGenerator;
use taskorc::watcher::{classify::FileKind, Change, Watcher};
use taskorc::worker_pool::WorkerPool;

struct NullPlanGenerator;

#[async_trait]
impl PlanGenerator for NullPlanGenerator {
    async fn generate(&self, _weight: Weight) -> DomainResult<Vec<Phase>> {
        Ok(vec![])
    }
}

fn test_watcher(root: &std::path::Path, worker_pool: Arc<WorkerPool>) -> Arc<Watcher> {
    let mut config = Config::default();
    config.debounce_ms = 80;
    let plan_generator: Arc<dyn PlanGenerator> = Arc::new(NullPlanGenerator);
    let task_store = Arc::new(taskorc::adapters::fs::FsTaskStore::new(root));
    Watcher::new(root, &config, plan_generator, task_store, worker_pool)
}

#[tokio::test]
async fn atomic_save_does_not_publish_a_spurious_delete() {
    let dir = tempfile::tempdir().unwrap();
    let task_dir = dir.path().join("tasks/TASK-001");
    tokio::fs::create_dir_all(&task_dir).await.unwrap();
    let task_file = task_dir.join("task.yaml");
    tokio::fs::write(&task_file, "id: TASK-001\n").await.unwrap();

    let worker_pool = empty_worker_pool().await;
    let watcher = test_watcher(dir.path(), worker_pool);
    let mut events = watcher.subscribe();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let run_handle = tokio::spawn(watcher.clone().run(shutdown_rx));
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Simulate an editor's atomic save: write to a tmp file, then rename
    // over the canonical path. notify reports this as remove+create.
    let tmp_path = task_dir.join("task.yaml.tmp");
    tokio::fs::write(&tmp_path, "id: TASK-001\ntitle: renamed\n").await.unwrap();
    tokio::fs::rename(&tmp_path, &task_file).await.unwrap();

    let mut saw_delete = false;
    let mut saw_upsert = false;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(800);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(50), events.recv()).await {
            Ok(Ok(evt)) if evt.entity_id == "TASK-001" && evt.file_kind == FileKind::Task => match evt.change {
                Change::Deleted => saw_delete = true,
                Change::Upserted { .. } => saw_upsert = true,
            },
            _ => {}
        }
    }

    assert!(saw_upsert, "expected an upsert event for the rewritten task.yaml");
    assert!(!saw_delete, "atomic save must not be reported as a delete");

    let _ = shutdown_tx.send(true);
    let _ = run_handle.await;
}

#[tokio::test]
async fn true_deletion_is_published_after_verification_delay() {
    let dir = tempfile::tempdir().unwrap();
    let task_dir = dir.path().join("tasks/TASK-002");
    tokio::fs::create_dir_all(&task_dir).await.unwrap();
    let task_file = task_dir.join("task.yaml");
    tokio::fs::write(&task_file, "id: TASK-002\n").await.unwrap();

    let worker_pool = empty_worker_pool().await;
    let watcher = test_watcher(dir.path(), worker_pool);
    let mut events = watcher.subscribe();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let run_handle = tokio::spawn(watcher.clone().run(shutdown_rx));
    tokio::time::sleep(Duration::from_millis(200)).await;

    tokio::fs::remove_file(&task_file).await.unwrap();

    let mut saw_delete = false;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(800);
    while tokio::time::Instant::now() < deadline {
        if let Ok(Ok(evt)) = tokio::time::timeout(Duration::from_millis(50), events.recv()).await {
            if evt.entity_id == "TASK-002" && matches!(evt.change, Change::Deleted) {
                saw_delete = true;
                break;
            }
        }
    }
    assert!(saw_delete, "a genuine delete with no rewrite must eventually publish");

    let _ = shutdown_tx.send(true);
    let _ = run_handle.await;
}

async fn empty_worker_pool() -> Arc<WorkerPool> {
    use taskorc::adapters::fs::{FilePromptService, FilePromptSink};
    use taskorc::domain::errors::DomainResult as Res;
    use taskorc::domain::models::{Plan as P, TaskID as T, TaskStatus, Worktree, WorktreeStatus};
    use taskorc::domain::ports::{TaskStore, WorktreeManager};
    use taskorc::event_bus::EventBus;

    struct Noop;
    #[async_trait]
    impl WorktreeManager for Noop {
        async fn create(&self, task_id: &T) -> Res<Worktree> {
            Ok(Worktree {
                task_id: task_id.clone(),
                path: "/tmp".to_string(),
                branch: "x".to_string(),
                status: WorktreeStatus::Active,
                created_at: chrono::Utc::now(),
            })
        }
        async fn cleanup(&self, _task_id: &T, _completed: bool, _failed: bool) -> Res<()> {
            Ok(())
        }
    }
    #[async_trait]
    impl TaskStore for Noop {
        async fn save_plan(&self, _task_id: &T, _plan: &P) -> Res<()> {
            Ok(())
        }
        async fn save_task_status(&self, _task_id: &T, _status: TaskStatus) -> Res<()> {
            Ok(())
        }
    }

    let dir = tempfile::tempdir().unwrap();
    Arc::new(WorkerPool::new(
        1,
        Arc::new(Noop),
        Arc::new(Noop),
        Arc::new(FilePromptService::new(dir.path())),
        Arc::new(FilePromptSink::default()),
        EventBus::new(),
        Config::default(),
    ))
}
