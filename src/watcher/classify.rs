//! Pure path classification for the filesystem watcher — no I/O, no notify
//! dependency, so it is unit-testable in isolation.

use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::TaskID;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Task,
    Initiative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Task,
    State,
    Plan,
    Spec,
    Initiative,
    Unknown,
}

impl FileKind {
    /// The file whose removal signals the entity itself was deleted.
    pub fn is_canonical_for(self, entity_kind: EntityKind) -> bool {
        match entity_kind {
            EntityKind::Task => matches!(self, FileKind::Task),
            EntityKind::Initiative => matches!(self, FileKind::Initiative),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub file_kind: FileKind,
}

fn classify_filename(name: &str) -> FileKind {
    match name {
        "task.yaml" => FileKind::Task,
        "state.yaml" => FileKind::State,
        "plan.yaml" => FileKind::Plan,
        "spec.md" => FileKind::Spec,
        "initiative.yaml" => FileKind::Initiative,
        _ => FileKind::Unknown,
    }
}

/// Guards against path traversal: alphanumeric, `-`, `_` only, non-empty.
pub fn validate_initiative_id(id: &str) -> DomainResult<()> {
    let valid = !id.is_empty()
        && !id.contains("..")
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidId(id.to_string(), "invalid initiative id"))
    }
}

/// Classifies an absolute path under `root` as `root/tasks/<TaskID>/<file>`
/// or `root/initiatives/<InitiativeID>/<file>`. Returns `None` for anything
/// outside this shape (including paths nested deeper than one level, or
/// carrying an identifier that fails its pattern guard).
pub fn classify(root: &Path, path: &Path) -> Option<Classified> {
    let rel = path.strip_prefix(root).ok()?;
    let mut comps = rel.components();

    let top = comps.next()?.as_os_str().to_str()?;
    let entity_kind = match top {
        "tasks" => EntityKind::Task,
        "initiatives" => EntityKind::Initiative,
        _ => return None,
    };

    let entity_id = comps.next()?.as_os_str().to_str()?.to_string();
    let filename = comps.next()?.as_os_str().to_str()?.to_string();

    // Reject anything nested deeper than entity_dir/file — e.g. a stray
    // subdirectory inside a task's own directory.
    if comps.next().is_some() {
        return None;
    }

    match entity_kind {
        EntityKind::Task => {
            if TaskID::parse(&entity_id).is_err() {
                return None;
            }
        }
        EntityKind::Initiative => {
            if validate_initiative_id(&entity_id).is_err() {
                return None;
            }
        }
    }

    Some(Classified { entity_kind, entity_id, file_kind: classify_filename(&filename) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn root() -> PathBuf {
        PathBuf::from("/repo")
    }

    #[test]
    fn classifies_task_files() {
        let c = classify(&root(), &root().join("tasks/TASK-001/state.yaml")).unwrap();
        assert_eq!(c.entity_kind, EntityKind::Task);
        assert_eq!(c.entity_id, "TASK-001");
        assert_eq!(c.file_kind, FileKind::State);
    }

    #[test]
    fn classifies_initiative_files() {
        let c = classify(&root(), &root().join("initiatives/launch-q3/initiative.yaml")).unwrap();
        assert_eq!(c.entity_kind, EntityKind::Initiative);
        assert_eq!(c.entity_id, "launch-q3");
        assert_eq!(c.file_kind, FileKind::Initiative);
    }

    #[test]
    fn rejects_invalid_task_id() {
        assert!(classify(&root(), &root().join("tasks/whatever/state.yaml")).is_none());
    }

    #[test]
    fn rejects_path_traversal_in_initiative_id() {
        assert!(validate_initiative_id("../../etc").is_err());
        assert!(validate_initiative_id("launch/q3").is_err());
    }

    #[test]
    fn rejects_paths_outside_root() {
        assert!(classify(&root(), Path::new("/elsewhere/tasks/TASK-001/state.yaml")).is_none());
    }

    #[test]
    fn rejects_nested_subdirectories() {
        assert!(classify(&root(), &root().join("tasks/TASK-001/nested/state.yaml")).is_none());
    }

    #[test]
    fn unknown_filenames_classify_as_unknown() {
        let c = classify(&root(), &root().join("tasks/TASK-001/notes.txt")).unwrap();
        assert_eq!(c.file_kind, FileKind::Unknown);
    }

    #[test]
    fn canonical_file_matches_only_its_own_entity_kind() {
        assert!(FileKind::Task.is_canonical_for(EntityKind::Task));
        assert!(!FileKind::Task.is_canonical_for(EntityKind::Initiative));
        assert!(FileKind::Initiative.is_canonical_for(EntityKind::Initiative));
    }
}
