//! Exercises the worker pool end-to-end against a real subprocess tree to
//! verify that stopping a worker terminates the whole process group, not
//! just the direct child (spec scenario: killing a worker must not leave
//! orphaned grandchildren running).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nix::unistd::Pid;

use taskorc::adapters::fs::{FilePromptService, FilePromptSink};
use taskorc::domain::errors::DomainResult;
use taskorc::domain::models::config::Config;
use taskorc::domain::models::{
    Category, Phase, Plan, Task, TaskID, TaskStatus, WorkerStatus, Weight, Worktree, WorktreeStatus,
};
use taskorc::domain::ports::{TaskStore, WorktreeManager};
use taskorc::event_bus::EventBus;
use taskorc::worker_pool::WorkerPool;

struct NoopWorktreeManager {
    path: String,
}

#[async_trait]
impl WorktreeManager for NoopWorktreeManager {
    async fn create(&self, task_id: &TaskID) -> DomainResult<Worktree> {
        Ok(Worktree {
            task_id: task_id.clone(),
            path: self.path.clone(),
            branch: "test".to_string(),
            status: WorktreeStatus::Active,
            created_at: chrono::Utc::now(),
        })
    }

    async fn cleanup(&self, _task_id: &TaskID, _completed: bool, _failed: bool) -> DomainResult<()> {
        Ok(())
    }
}

struct NoopTaskStore;

#[async_trait]
impl TaskStore for NoopTaskStore {
    async fn save_plan(&self, _task_id: &TaskID, _plan: &Plan) -> DomainResult<()> {
        Ok(())
    }

    async fn save_task_status(&self, _task_id: &TaskID, _status: TaskStatus) -> DomainResult<()> {
        Ok(())
    }
}

fn process_alive(pid: i32) -> bool {
    nix::sys::signal::kill(Pid::from_raw(pid), None).is_ok()
}

#[tokio::test]
async fn stopping_a_worker_kills_the_whole_process_group() {
    let worktree_dir = tempfile::tempdir().unwrap();
    let prompts_dir = tempfile::tempdir().unwrap();
    tokio::fs::create_dir_all(prompts_dir.path().join("prompts")).await.unwrap();
    tokio::fs::write(prompts_dir.path().join("prompts/implement.md"), "do the thing").await.unwrap();

    let child_pid_file = worktree_dir.path().join("child.pid");
    let mut config = Config::default();
    config.worker_command = vec![
        "bash".to_string(),
        "-c".to_string(),
        format!("sleep 60 & echo $! > {}; wait", child_pid_file.display()),
    ];

    let worktree_manager = Arc::new(NoopWorktreeManager { path: worktree_dir.path().display().to_string() });
    let task_store = Arc::new(NoopTaskStore);
    let prompts = Arc::new(FilePromptService::new(prompts_dir.path()));
    let prompt_sink = Arc::new(FilePromptSink::default());
    let event_bus = EventBus::new();

    let pool = Arc::new(WorkerPool::new(4, worktree_manager, task_store, prompts, prompt_sink, event_bus, config));

    let task_id = TaskID::parse("TASK-900").unwrap();
    let task = Task::new(task_id.clone(), "process group test", Weight::Small, Category::Chore);
    let plan = Plan::new(vec![Phase::new("implement", "sentinel gone")]);

    pool.spawn_worker(task, plan).await.unwrap();

    // Wait for the subprocess to actually start and record its child's pid.
    let mut child_pid: Option<i32> = None;
    for _ in 0..50 {
        if let Ok(contents) = tokio::fs::read_to_string(&child_pid_file).await {
            if let Ok(pid) = contents.trim().parse::<i32>() {
                child_pid = Some(pid);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let child_pid = child_pid.expect("grandchild pid was never recorded");
    assert!(process_alive(child_pid), "grandchild should be running before stop");

    pool.stop_worker(&task_id).await.unwrap();

    // killpg is asynchronous from the test's perspective; poll briefly.
    let mut still_alive = true;
    for _ in 0..50 {
        if !process_alive(child_pid) {
            still_alive = false;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(!still_alive, "grandchild process should have been killed via its process group");

    let snapshot = pool.get_worker(&task_id).await.unwrap();
    assert_eq!(snapshot.status, WorkerStatus::Paused);
}
