//! Builtin charts shipped with bow

mod postgresql;
mod redis;
mod redmine;

pub use postgresql::PostgresqlChart;
pub use redis::RedisChart;
pub use redmine::RedmineChart;

use bow_core::{ResourceRequests, Values};

pub(crate) fn opt_str(values: &Values, path: &str) -> Option<String> {
    values
        .get(path)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Resource requests from a `resources:` values subtree, or None when
/// the subtree is absent or empty
pub(crate) fn resource_requests(values: &Values, path: &str) -> Option<ResourceRequests> {
    let subtree = values.get(path)?;
    if !subtree.as_object().map(|m| !m.is_empty()).unwrap_or(false) {
        return None;
    }
    let mut requests = ResourceRequests::new();
    requests.cpu = opt_str(values, &format!("{path}.cpu"));
    requests.memory = opt_str(values, &format!("{path}.memory"));
    requests.limits_cpu = opt_str(values, &format!("{path}.limits_cpu"));
    requests.limits_memory = opt_str(values, &format!("{path}.limits_memory"));
    Some(requests)
}
