//! Task Locator - resolves a task name or identifier to a task descriptor

use crate::qms::{QmsApi, ServiceKey, TaskDescriptor};
use crate::Result;
use regex::Regex;
use std::sync::OnceLock;

/// 8-4-4-4-12 hex digits, optionally wrapped in braces
fn guid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\{?[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\}?$")
            .expect("GUID pattern is valid")
    })
}

/// Check whether a selector looks like a task identifier
pub fn is_task_id(selector: &str) -> bool {
    guid_pattern().is_match(selector)
}

/// Resolve the selector to a task, `None` when the service has no match.
///
/// Identifiers go straight to `GetTask`. Names are searched with `FindEDX`,
/// which may return the same task replicated on several distribution
/// services; the first candidate whose name matches exactly wins.
pub async fn locate<C>(client: &C, key: &ServiceKey, selector: &str) -> Result<Option<TaskDescriptor>>
where
    C: QmsApi + ?Sized,
{
    if is_task_id(selector) {
        log::debug!("Looking up task by id: {}", selector);
        return client.get_task(key, selector).await;
    }

    log::debug!("Searching EDX tasks named: {}", selector);
    let candidates = client.find_edx(key, selector).await?;

    if candidates.len() > 1 {
        log::debug!("{} candidates share the name {}", candidates.len(), selector);
    }

    Ok(candidates.into_iter().find(|task| task.name == selector))
}
