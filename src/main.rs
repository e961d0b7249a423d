//! taskorc entry point: loads configuration, wires the scheduler/worker
//! pool/automation engine/watcher together, and dispatches the thin CLI.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use taskorc::adapters::fs::{
    FilePromptService, FilePromptSink, FsTaskCreator, FsTaskLoader, FsTaskStore, FsWorktreeManager,
};
use taskorc::adapters::sqlite::{initialize_database, SqliteDatabase};
use taskorc::automation::{cooldown, AutomationEngine, ScheduleRunner};
use taskorc::cli::{Cli, Commands, TriggerCommands};
use taskorc::domain::models::scheduled_task::Priority;
use taskorc::domain::models::{Config, TaskID, TaskStatus};
use taskorc::domain::ports::Database;
use taskorc::event_bus::EventBus;
use taskorc::infrastructure::config::{from_config_all, ConfigLoader};
use taskorc::infrastructure::logging::LoggerImpl;
use taskorc::orchestrator::Orchestrator;
use taskorc::planning::StandardPlanGenerator;
use taskorc::scheduler::Scheduler;
use taskorc::watcher::{classify::FileKind, Change, Watcher};
use taskorc::worker_pool::WorkerPool;

const PROJECT_ROOT: &str = ".";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_daemon().await,
        Commands::Trigger(args) => run_trigger_command(args.command).await,
    }
}

async fn run_daemon() -> Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    LoggerImpl::init(&config.logging).context("failed to initialize logging")?;
    info!(max_concurrent = config.max_concurrent, "starting taskorc");

    let database_url = format!("sqlite:{}", config.database.path);
    let pool = initialize_database(&database_url).await.context("failed to initialize database")?;
    let db: Arc<dyn Database> = Arc::new(SqliteDatabase::new(pool));

    seed_triggers(db.as_ref(), &config).await?;

    let event_bus = EventBus::new();
    let plan_generator = Arc::new(StandardPlanGenerator);
    let task_store = Arc::new(FsTaskStore::new(PROJECT_ROOT));
    let worktree_manager = Arc::new(FsWorktreeManager::new(PROJECT_ROOT, config.worktree_dir.clone()));
    let prompts = Arc::new(FilePromptService::new(PROJECT_ROOT));
    let prompt_sink = Arc::new(FilePromptSink::default());
    let task_creator = Arc::new(FsTaskCreator::new(PROJECT_ROOT));

    let worker_pool = Arc::new(WorkerPool::new(
        config.max_concurrent,
        worktree_manager,
        task_store.clone(),
        prompts,
        prompt_sink,
        event_bus.clone(),
        config.clone(),
    ));

    let scheduler = Arc::new(Scheduler::new(config.max_concurrent));

    let global_cooldown = cooldown::parse_duration(&config.automation.global_cooldown)
        .context("invalid automation.global_cooldown")?;
    let automation = Arc::new(AutomationEngine::new(
        db.clone(),
        event_bus.clone(),
        config.automation.enabled,
        global_cooldown,
        config.team_mode,
    ));
    automation.set_task_creator(task_creator).await;

    let task_loader = Arc::new(FsTaskLoader::new(PROJECT_ROOT, plan_generator.clone()));
    seed_scheduler(&scheduler, task_loader.as_ref()).await;

    let orchestrator = Orchestrator::new(
        scheduler.clone(),
        worker_pool.clone(),
        automation.clone(),
        task_loader,
        event_bus.clone(),
        std::time::Duration::from_millis(config.poll_interval_ms),
        config.max_concurrent,
    );

    let watcher = Watcher::new(PROJECT_ROOT, &config, plan_generator, task_store, worker_pool.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut event_bus_rx = event_bus.subscribe();
    let automation_for_events = automation.clone();
    let event_loop = tokio::spawn(async move {
        loop {
            match event_bus_rx.recv().await {
                Ok(event) => {
                    if let Err(err) = automation_for_events.handle_event(&event).await {
                        warn!(%err, "automation engine failed to handle event");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "automation event loop lagged, dropped events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    let mut watcher_rx = watcher.subscribe();
    let scheduler_for_watch = scheduler.clone();
    let watcher_bridge = tokio::spawn(async move {
        loop {
            match watcher_rx.recv().await {
                Ok(evt) => {
                    if evt.file_kind == FileKind::Task {
                        if let Change::Upserted { .. } = evt.change {
                            if let Ok(task_id) = TaskID::parse(&evt.entity_id) {
                                enqueue_if_pending(&scheduler_for_watch, &task_id, PROJECT_ROOT).await;
                            }
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "watcher bridge lagged, dropped events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    let watcher_task = tokio::spawn(watcher.run(shutdown_rx.clone()));

    let schedule_runner_task = if config.team_mode {
        let runner = Arc::new(ScheduleRunner::new(automation.clone(), db.clone()));
        Some(tokio::spawn(runner.run(shutdown_rx.clone())))
    } else {
        None
    };

    let orchestrator_task = tokio::spawn(async move {
        orchestrator.run(shutdown_rx).await;
    });

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = orchestrator_task.await;
    let _ = watcher_task.await;
    event_loop.abort();
    watcher_bridge.abort();
    if let Some(task) = schedule_runner_task {
        task.abort();
    }

    Ok(())
}

async fn enqueue_if_pending(scheduler: &Scheduler, task_id: &TaskID, root: &str) {
    let path = std::path::Path::new(root).join("tasks").join(task_id.as_str()).join("task.yaml");
    let Ok(contents) = tokio::fs::read_to_string(&path).await else { return };
    let Ok(task) = serde_yaml::from_str::<taskorc::domain::models::Task>(&contents) else { return };
    if matches!(task.status, TaskStatus::Created) {
        scheduler
            .add_task(task.id.clone(), task.title.clone(), Default::default(), Priority::DEFAULT)
            .await;
    }
}

async fn seed_scheduler(scheduler: &Scheduler, task_loader: &FsTaskLoader) {
    match task_loader.discover_pending().await {
        Ok(tasks) => {
            for task in tasks {
                scheduler
                    .add_task(task.id.clone(), task.title.clone(), Default::default(), Priority::DEFAULT)
                    .await;
            }
        }
        Err(err) => warn!(%err, "failed to discover pending tasks at startup"),
    }
}

/// Seeds the trigger table from configuration on first run. Leaves existing
/// rows untouched once at least one trigger is already persisted, so a
/// restart doesn't duplicate triggers or clobber runtime enable/disable state.
async fn seed_triggers(db: &dyn Database, config: &Config) -> Result<()> {
    if !db.load_all_triggers().await?.is_empty() {
        return Ok(());
    }
    let triggers = from_config_all(&config.automation.triggers).context("invalid trigger configuration")?;
    for trigger in &triggers {
        db.save_trigger(trigger).await?;
    }
    if !triggers.is_empty() {
        info!(count = triggers.len(), "seeded automation triggers from configuration");
    }
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn run_trigger_command(command: TriggerCommands) -> Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let database_url = format!("sqlite:{}", config.database.path);
    let pool = initialize_database(&database_url).await.context("failed to initialize database")?;
    let db = SqliteDatabase::new(pool);

    match command {
        TriggerCommands::List => {
            let triggers = db.load_all_triggers().await?;
            if triggers.is_empty() {
                println!("no triggers configured");
            }
            for trigger in triggers {
                println!(
                    "{}  {:?}  enabled={}  fired={}  template={:?}",
                    trigger.id, trigger.trigger_type, trigger.enabled, trigger.trigger_count, trigger.action.template
                );
            }
        }
        TriggerCommands::Enable { id } => {
            db.set_trigger_enabled(id, true).await?;
            println!("enabled {id}");
        }
        TriggerCommands::Disable { id } => {
            db.set_trigger_enabled(id, false).await?;
            println!("disabled {id}");
        }
    }
    Ok(())
}
