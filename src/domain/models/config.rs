//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded by `infrastructure::config::ConfigLoader`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Worker pool capacity ceiling.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Orchestrator tick interval, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub automation: AutomationConfig,

    /// Enables schedule-type triggers and duration cooldowns.
    #[serde(default)]
    pub team_mode: bool,

    /// Base directory for per-task worktrees.
    #[serde(default = "default_worktree_dir")]
    pub worktree_dir: String,

    /// Watcher coalescing interval, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Prepended to autogenerated VCS commit messages.
    #[serde(default = "default_commit_prefix")]
    pub commit_prefix: String,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Program + templated args used to spawn each phase's subprocess.
    /// `{task_id}`, `{phase_id}`, `{worktree}` are substituted per-phase.
    #[serde(default = "default_worker_command")]
    pub worker_command: Vec<String>,

    /// Phase iteration cap passed to the prompt sink.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Sentinel file name whose disappearance signals phase completion.
    #[serde(default = "default_completion_sentinel")]
    pub completion_sentinel: String,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_worktree_dir() -> String {
    ".taskorc/worktrees".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_commit_prefix() -> String {
    "[taskorc]".to_string()
}

fn default_worker_command() -> Vec<String> {
    vec![
        "claude".to_string(),
        "--task".to_string(),
        "{task_id}".to_string(),
        "--phase".to_string(),
        "{phase_id}".to_string(),
    ]
}

fn default_max_iterations() -> u32 {
    30
}

fn default_completion_sentinel() -> String {
    "PHASE_COMPLETE".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            poll_interval_ms: default_poll_interval_ms(),
            automation: AutomationConfig::default(),
            team_mode: false,
            worktree_dir: default_worktree_dir(),
            debounce_ms: default_debounce_ms(),
            commit_prefix: default_commit_prefix(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            worker_command: default_worker_command(),
            max_iterations: default_max_iterations(),
            completion_sentinel: default_completion_sentinel(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Minimum gap, as a cooldown literal (`"2h"`, `"30m"`), between any two firings.
    #[serde(default = "default_global_cooldown")]
    pub global_cooldown: String,

    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
}

fn default_global_cooldown() -> String {
    "0s".to_string()
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            global_cooldown: default_global_cooldown(),
            triggers: Vec::new(),
        }
    }
}

/// Declarative trigger definition as it appears in configuration, before
/// being parsed into a domain `Trigger`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TriggerDef {
    pub trigger_type: String,
    pub mode: String,
    pub template: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub queue: String,
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub filter: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub cron_expr: String,
    #[serde(default)]
    pub cooldown: Option<CooldownSpec>,
}

/// Either a single literal (`"3 tasks"`, `"2h"`) covering one cooldown leg,
/// or a structured form specifying both legs explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CooldownSpec {
    Literal(String),
    Structured {
        #[serde(default)]
        tasks: Option<u32>,
        #[serde(default)]
        duration: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".taskorc/taskorc.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = Config::default();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.poll_interval_ms, 2_000);
        assert!(!config.automation.enabled);
        assert_eq!(config.worktree_dir, ".taskorc/worktrees");
    }

    #[test]
    fn yaml_parsing_merges_with_defaults() {
        let yaml = r"
max_concurrent: 8
automation:
  enabled: true
  global_cooldown: 2h
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_concurrent, 8);
        assert!(config.automation.enabled);
        assert_eq!(config.automation.global_cooldown, "2h");
        assert_eq!(config.debounce_ms, 500, "unset fields keep their defaults");
    }
}
