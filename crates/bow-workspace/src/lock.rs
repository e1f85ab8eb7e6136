//! bow.lock management
//!
//! bow.lock format:
//!
//! ```yaml
//! apiVersion: bow.io/v1
//! kind: Lock
//! chart: postgresql            # or stack: stack.yaml
//! version: "16.4.0"
//! namespace: t1-postgresql
//! checksum: sha256:abc123...
//! ```
//!
//! The checksum covers stack.yaml, values.yaml and the values.*.yaml
//! overlays; the lock file never hashes itself.

use std::path::Path;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{Result, WorkspaceError};

pub const LOCK_FILE: &str = "bow.lock";

/// Parsed bow.lock. Exactly one of `chart` and `stack` is set.
#[derive(Debug, Clone, Default)]
pub struct LockSpec {
    pub chart: Option<String>,
    pub stack: Option<String>,
    pub version: Option<String>,
    pub namespace: Option<String>,
    pub checksum: Option<String>,
    pub create_namespace: bool,
}

impl LockSpec {
    pub fn for_chart(chart: impl Into<String>) -> Self {
        Self {
            chart: Some(chart.into()),
            ..Default::default()
        }
    }

    pub fn for_stack(stack: impl Into<String>) -> Self {
        Self {
            stack: Some(stack.into()),
            ..Default::default()
        }
    }

    pub fn is_stack(&self) -> bool {
        self.stack.is_some()
    }

    /// Human-readable target label, "chart@version" when both are known
    pub fn display_name(&self) -> String {
        if let Some(chart) = &self.chart {
            return match &self.version {
                Some(version) => format!("{chart}@{version}"),
                None => chart.clone(),
            };
        }
        self.stack.clone().unwrap_or_else(|| "unknown".to_string())
    }
}

pub fn parse_lock<P: AsRef<Path>>(path: P) -> Result<LockSpec> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(WorkspaceError::LockNotFound {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let data: Value = serde_yaml::from_str(&content)?;
    if !data.is_object() {
        return Err(WorkspaceError::LockInvalid(format!(
            "lock file must be a YAML mapping: {}",
            path.display()
        )));
    }

    let get_str = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let chart = get_str("chart");
    let stack = get_str("stack");

    match (&chart, &stack) {
        (None, None) => {
            return Err(WorkspaceError::LockInvalid(
                "lock file must specify either 'chart' or 'stack'".to_string(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(WorkspaceError::LockInvalid(
                "lock file cannot specify both 'chart' and 'stack'".to_string(),
            ))
        }
        _ => {}
    }

    Ok(LockSpec {
        chart,
        stack,
        version: get_str("version"),
        namespace: get_str("namespace"),
        checksum: get_str("checksum"),
        create_namespace: data
            .get("create_namespace")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

pub fn write_lock<P: AsRef<Path>>(lock: &LockSpec, path: P) -> Result<()> {
    // serde_json's map preserves insertion order, which fixes the key
    // order in the written file
    let mut data = Map::new();
    data.insert("apiVersion".to_string(), Value::String("bow.io/v1".to_string()));
    data.insert("kind".to_string(), Value::String("Lock".to_string()));

    if let Some(chart) = &lock.chart {
        data.insert("chart".to_string(), Value::String(chart.clone()));
    }
    if let Some(stack) = &lock.stack {
        data.insert("stack".to_string(), Value::String(stack.clone()));
    }
    if let Some(version) = &lock.version {
        data.insert("version".to_string(), Value::String(version.clone()));
    }
    if let Some(namespace) = &lock.namespace {
        data.insert("namespace".to_string(), Value::String(namespace.clone()));
    }
    if lock.create_namespace {
        data.insert("create_namespace".to_string(), Value::Bool(true));
    }
    if let Some(checksum) = &lock.checksum {
        data.insert("checksum".to_string(), Value::String(checksum.clone()));
    }

    let yaml = serde_yaml::to_string(&Value::Object(data))?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Deterministic checksum over the workspace's deploy inputs.
///
/// Covered files, in fixed order: stack.yaml (if present), values.yaml
/// (if present), then values.*.yaml sorted by name. Both the file name
/// and the bytes feed the hash, so renaming a stage overlay changes the
/// checksum even with identical content.
pub fn compute_checksum<P: AsRef<Path>>(workspace_dir: P) -> Result<String> {
    let ws = workspace_dir.as_ref();
    let mut hasher = Sha256::new();

    let mut files = Vec::new();
    let stack_file = ws.join("stack.yaml");
    if stack_file.exists() {
        files.push(stack_file);
    }
    let values_main = ws.join("values.yaml");
    if values_main.exists() {
        files.push(values_main);
    }

    let mut overlays = Vec::new();
    for entry in std::fs::read_dir(ws)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("values.") && name.ends_with(".yaml") && name != "values.yaml" {
            overlays.push(entry.path());
        }
    }
    overlays.sort();
    files.extend(overlays);

    for path in files {
        if let Some(name) = path.file_name() {
            hasher.update(name.to_string_lossy().as_bytes());
        }
        hasher.update(std::fs::read(&path)?);
    }

    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

/// True when the workspace files no longer match the lock's checksum.
/// A lock without a checksum never reports drift.
pub fn check_drift<P: AsRef<Path>>(workspace_dir: P, lock: &LockSpec) -> Result<bool> {
    let stored = match &lock.checksum {
        Some(checksum) => checksum,
        None => return Ok(false),
    };
    Ok(compute_checksum(workspace_dir)? != *stored)
}
