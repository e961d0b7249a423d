//! Cooldown literal parsing: `"N tasks"` / `"N task"` → task-count leg;
//! duration literals (`"2h"`, `"30m"`, `"45s"`, `"500ms"`) → duration leg;
//! the structured `{tasks, duration}` form sets both explicitly.

use chrono::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::CooldownSpec;
use crate::domain::models::Cooldown;

pub fn parse(spec: &CooldownSpec) -> DomainResult<Cooldown> {
    match spec {
        CooldownSpec::Literal(s) => parse_literal(s),
        CooldownSpec::Structured { tasks, duration } => Ok(Cooldown {
            tasks: *tasks,
            duration: duration.as_deref().map(parse_duration).transpose()?,
        }),
    }
}

fn parse_literal(raw: &str) -> DomainResult<Cooldown> {
    let trimmed = raw.trim();
    if let Some(count) = trimmed.strip_suffix(" tasks").or_else(|| trimmed.strip_suffix(" task")) {
        let n: u32 = count
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidId(raw.to_string(), "cooldown task count must be an integer"))?;
        return Ok(Cooldown { tasks: Some(n), duration: None });
    }
    Ok(Cooldown { tasks: None, duration: Some(parse_duration(trimmed)?) })
}

/// Parses a duration literal with a trailing unit: `ms`, `s`, `m`, `h`.
/// Checked in that order so `"30ms"` isn't misread as `"30m"` + stray `s`.
pub fn parse_duration(raw: &str) -> DomainResult<Duration> {
    let trimmed = raw.trim();
    let invalid = || DomainError::InvalidId(raw.to_string(), "not a valid duration literal (expect e.g. 2h, 30m, 45s, 500ms)");

    if let Some(n) = trimmed.strip_suffix("ms") {
        return Ok(Duration::milliseconds(n.parse().map_err(|_| invalid())?));
    }
    if let Some(n) = trimmed.strip_suffix('h') {
        return Ok(Duration::hours(n.parse().map_err(|_| invalid())?));
    }
    if let Some(n) = trimmed.strip_suffix('m') {
        return Ok(Duration::minutes(n.parse().map_err(|_| invalid())?));
    }
    if let Some(n) = trimmed.strip_suffix('s') {
        return Ok(Duration::seconds(n.parse().map_err(|_| invalid())?));
    }
    Err(invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_task_count_literal() {
        let c = parse(&CooldownSpec::Literal("3 tasks".to_string())).unwrap();
        assert_eq!(c.tasks, Some(3));
        assert!(c.duration.is_none());
    }

    #[test]
    fn parses_singular_task_literal() {
        let c = parse(&CooldownSpec::Literal("1 task".to_string())).unwrap();
        assert_eq!(c.tasks, Some(1));
    }

    #[test]
    fn parses_duration_literals() {
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::milliseconds(500));
    }

    #[test]
    fn structured_form_sets_both_legs() {
        let c = parse(&CooldownSpec::Structured {
            tasks: Some(2),
            duration: Some("1h".to_string()),
        })
        .unwrap();
        assert_eq!(c.tasks, Some(2));
        assert_eq!(c.duration, Some(Duration::hours(1)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("soon").is_err());
    }
}
