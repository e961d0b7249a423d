//! Thin CLI surface: enough to run the daemon and inspect/toggle
//! automation triggers. Not a reimplementation of a fuller task-management
//! CLI — that surface is explicitly out of scope.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taskorc", about = "Project-scoped task orchestrator", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the orchestrator loop until interrupted.
    Run,
    /// Inspect or toggle automation triggers.
    Trigger(TriggerArgs),
}

#[derive(Parser, Debug)]
pub struct TriggerArgs {
    #[command(subcommand)]
    pub command: TriggerCommands,
}

#[derive(Subcommand, Debug)]
pub enum TriggerCommands {
    /// List all configured triggers and their enabled state.
    List,
    /// Enable a trigger by ID.
    Enable { id: uuid::Uuid },
    /// Disable a trigger by ID.
    Disable { id: uuid::Uuid },
}
