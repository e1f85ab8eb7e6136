//! Concrete Kubernetes resources
//!
//! The resource set is a closed enum: adding a kind means extending
//! [`Resource`] and every exhaustive match on it. Scope-capable resources
//! (workloads, Service, ConfigMap, Secret, Ingress) are opened through
//! [`crate::Context`]; leaf fragments (Port, EnvVar, probes, volumes, ...)
//! are added through leaf calls on the context.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{CoreError, Result};

/// A single rendered Kubernetes document
pub type Document = Value;

pub(crate) fn string_map_value(map: &IndexMap<String, String>) -> Value {
    let mut out = Map::new();
    for (k, v) in map {
        out.insert(k.clone(), Value::String(v.clone()));
    }
    Value::Object(out)
}

/// Object metadata shared by every resource
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub name: String,
    pub namespace: Option<String>,
    pub labels: IndexMap<String, String>,
    pub annotations: IndexMap<String, String>,
}

impl Metadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn render(&self) -> Value {
        let mut m = Map::new();
        m.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(ns) = &self.namespace {
            m.insert("namespace".to_string(), Value::String(ns.clone()));
        }
        if !self.labels.is_empty() {
            m.insert("labels".to_string(), string_map_value(&self.labels));
        }
        if !self.annotations.is_empty() {
            m.insert("annotations".to_string(), string_map_value(&self.annotations));
        }
        Value::Object(m)
    }
}

// ─────────────────────────────────────────────
// Container and its leaf fragments
// ─────────────────────────────────────────────

/// Pod spec container. Not a standalone document; owned by exactly one
/// workload. Opened as a scope so leaf calls can extend it.
#[derive(Debug, Clone)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub command: Option<Vec<String>>,
    pub args: Option<Vec<String>>,
    pub image_pull_policy: Option<String>,
    pub(crate) ports: Vec<Value>,
    pub(crate) env: Vec<Value>,
    pub(crate) resources: Option<Value>,
    pub(crate) volume_mounts: Vec<Value>,
    pub(crate) probes: IndexMap<&'static str, Value>,
}

impl Container {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: None,
            args: None,
            image_pull_policy: None,
            ports: Vec::new(),
            env: Vec::new(),
            resources: None,
            volume_mounts: Vec::new(),
            probes: IndexMap::new(),
        }
    }

    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn image_pull_policy(mut self, policy: impl Into<String>) -> Self {
        self.image_pull_policy = Some(policy.into());
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut spec = Map::new();
        spec.insert("name".to_string(), Value::String(self.name.clone()));
        spec.insert("image".to_string(), Value::String(self.image.clone()));
        if let Some(command) = &self.command {
            spec.insert("command".to_string(), json!(command));
        }
        if let Some(args) = &self.args {
            spec.insert("args".to_string(), json!(args));
        }
        if let Some(policy) = &self.image_pull_policy {
            spec.insert("imagePullPolicy".to_string(), Value::String(policy.clone()));
        }
        if !self.ports.is_empty() {
            spec.insert("ports".to_string(), Value::Array(self.ports.clone()));
        }
        if !self.env.is_empty() {
            spec.insert("env".to_string(), Value::Array(self.env.clone()));
        }
        if let Some(resources) = &self.resources {
            spec.insert("resources".to_string(), resources.clone());
        }
        if !self.volume_mounts.is_empty() {
            spec.insert("volumeMounts".to_string(), Value::Array(self.volume_mounts.clone()));
        }
        for key in ["livenessProbe", "readinessProbe", "startupProbe"] {
            if let Some(probe) = self.probes.get(key) {
                spec.insert(key.to_string(), probe.clone());
            }
        }
        Value::Object(spec)
    }
}

/// Container port leaf
#[derive(Debug, Clone)]
pub struct Port {
    pub container_port: u16,
    pub name: Option<String>,
    pub protocol: String,
}

impl Port {
    pub fn new(container_port: u16) -> Self {
        Self {
            container_port,
            name: None,
            protocol: "TCP".to_string(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut p = Map::new();
        p.insert("containerPort".to_string(), json!(self.container_port));
        p.insert("protocol".to_string(), Value::String(self.protocol.clone()));
        if let Some(name) = &self.name {
            p.insert("name".to_string(), Value::String(name.clone()));
        }
        Value::Object(p)
    }
}

/// Container environment variable leaf
///
/// Exactly one source is rendered. When several are set the precedence is
/// secret > configmap > field > literal value.
#[derive(Debug, Clone, Default)]
pub struct EnvVar {
    pub name: String,
    pub value: Option<String>,
    pub secret_ref: Option<String>,
    pub secret_key: Option<String>,
    pub configmap_ref: Option<String>,
    pub configmap_key: Option<String>,
    pub field_ref: Option<String>,
}

impl EnvVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Literal value shorthand
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name).value(value)
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret_ref = Some(secret.into());
        self
    }

    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    pub fn configmap(mut self, configmap: impl Into<String>) -> Self {
        self.configmap_ref = Some(configmap.into());
        self
    }

    pub fn configmap_key(mut self, key: impl Into<String>) -> Self {
        self.configmap_key = Some(key.into());
        self
    }

    pub fn field(mut self, field_path: impl Into<String>) -> Self {
        self.field_ref = Some(field_path.into());
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("name".to_string(), Value::String(self.name.clone()));

        if let Some(secret) = &self.secret_ref {
            entry.insert(
                "valueFrom".to_string(),
                json!({
                    "secretKeyRef": {
                        "name": secret,
                        "key": self.secret_key.as_deref().unwrap_or(&self.name),
                    }
                }),
            );
        } else if let Some(configmap) = &self.configmap_ref {
            entry.insert(
                "valueFrom".to_string(),
                json!({
                    "configMapKeyRef": {
                        "name": configmap,
                        "key": self.configmap_key.as_deref().unwrap_or(&self.name),
                    }
                }),
            );
        } else if let Some(field) = &self.field_ref {
            entry.insert("valueFrom".to_string(), json!({"fieldRef": {"fieldPath": field}}));
        } else {
            entry.insert(
                "value".to_string(),
                Value::String(self.value.clone().unwrap_or_default()),
            );
        }

        Value::Object(entry)
    }
}

/// Container resource requests/limits leaf. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct ResourceRequests {
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub limits_cpu: Option<String>,
    pub limits_memory: Option<String>,
}

impl ResourceRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cpu(mut self, cpu: impl Into<String>) -> Self {
        self.cpu = Some(cpu.into());
        self
    }

    pub fn memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }

    pub fn limits_cpu(mut self, cpu: impl Into<String>) -> Self {
        self.limits_cpu = Some(cpu.into());
        self
    }

    pub fn limits_memory(mut self, memory: impl Into<String>) -> Self {
        self.limits_memory = Some(memory.into());
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut r = Map::new();
        if self.cpu.is_some() || self.memory.is_some() {
            let mut requests = Map::new();
            if let Some(cpu) = &self.cpu {
                requests.insert("cpu".to_string(), Value::String(cpu.clone()));
            }
            if let Some(memory) = &self.memory {
                requests.insert("memory".to_string(), Value::String(memory.clone()));
            }
            r.insert("requests".to_string(), Value::Object(requests));
        }
        if self.limits_cpu.is_some() || self.limits_memory.is_some() {
            let mut limits = Map::new();
            if let Some(cpu) = &self.limits_cpu {
                limits.insert("cpu".to_string(), Value::String(cpu.clone()));
            }
            if let Some(memory) = &self.limits_memory {
                limits.insert("memory".to_string(), Value::String(memory.clone()));
            }
            r.insert("limits".to_string(), Value::Object(limits));
        }
        Value::Object(r)
    }
}

/// Container volume mount leaf
#[derive(Debug, Clone)]
pub struct VolumeMount {
    pub mount_path: String,
    pub name: String,
    pub sub_path: Option<String>,
    pub read_only: bool,
}

impl VolumeMount {
    pub fn new(mount_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mount_path: mount_path.into(),
            name: name.into(),
            sub_path: None,
            read_only: false,
        }
    }

    pub fn sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut m = Map::new();
        m.insert("name".to_string(), Value::String(self.name.clone()));
        m.insert("mountPath".to_string(), Value::String(self.mount_path.clone()));
        if let Some(sub_path) = &self.sub_path {
            m.insert("subPath".to_string(), Value::String(sub_path.clone()));
        }
        if self.read_only {
            m.insert("readOnly".to_string(), Value::Bool(true));
        }
        Value::Object(m)
    }
}

#[derive(Debug, Clone)]
enum ProbeHandler {
    HttpGet { path: String, port: u16 },
    TcpSocket { port: u16 },
    Exec { command: Vec<String> },
}

/// Container probe leaf. The probe type string ("liveness", "readiness",
/// "startup") is validated when the leaf call is made; at most one probe
/// per type is kept (last write wins).
#[derive(Debug, Clone)]
pub struct Probe {
    handler: ProbeHandler,
    pub initial_delay: i64,
    pub period: i64,
    pub timeout: i64,
    pub failure_threshold: i64,
}

impl Probe {
    fn with_handler(handler: ProbeHandler) -> Self {
        Self {
            handler,
            initial_delay: 0,
            period: 10,
            timeout: 1,
            failure_threshold: 3,
        }
    }

    pub fn http_get(path: impl Into<String>, port: u16) -> Self {
        Self::with_handler(ProbeHandler::HttpGet {
            path: path.into(),
            port,
        })
    }

    pub fn tcp_socket(port: u16) -> Self {
        Self::with_handler(ProbeHandler::TcpSocket { port })
    }

    pub fn exec<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_handler(ProbeHandler::Exec {
            command: command.into_iter().map(Into::into).collect(),
        })
    }

    pub fn initial_delay(mut self, seconds: i64) -> Self {
        self.initial_delay = seconds;
        self
    }

    pub fn period(mut self, seconds: i64) -> Self {
        self.period = seconds;
        self
    }

    pub fn timeout(mut self, seconds: i64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn failure_threshold(mut self, count: i64) -> Self {
        self.failure_threshold = count;
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut probe = Map::new();
        probe.insert("initialDelaySeconds".to_string(), json!(self.initial_delay));
        probe.insert("periodSeconds".to_string(), json!(self.period));
        probe.insert("timeoutSeconds".to_string(), json!(self.timeout));
        probe.insert("failureThreshold".to_string(), json!(self.failure_threshold));
        match &self.handler {
            ProbeHandler::HttpGet { path, port } => {
                probe.insert("httpGet".to_string(), json!({"path": path, "port": port}));
            }
            ProbeHandler::TcpSocket { port } => {
                probe.insert("tcpSocket".to_string(), json!({"port": port}));
            }
            ProbeHandler::Exec { command } => {
                probe.insert("exec".to_string(), json!({"command": command}));
            }
        }
        Value::Object(probe)
    }
}

/// Map a probe type string to its pod-spec key
pub(crate) fn probe_key(kind: &str) -> Result<&'static str> {
    match kind {
        "liveness" => Ok("livenessProbe"),
        "readiness" => Ok("readinessProbe"),
        "startup" => Ok("startupProbe"),
        other => Err(CoreError::UnknownProbe {
            kind: other.to_string(),
        }),
    }
}

// ─────────────────────────────────────────────
// Namespace
// ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Namespace {
    pub(crate) metadata: Metadata,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(name),
        }
    }

    pub fn labels(mut self, labels: IndexMap<String, String>) -> Self {
        self.metadata.labels = labels;
        self
    }

    pub(crate) fn render(&self) -> Document {
        json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": self.metadata.render(),
        })
    }
}

// ─────────────────────────────────────────────
// PersistentVolumeClaim
// ─────────────────────────────────────────────

/// PVC with an enabled flag. A disabled claim is kept in its owning
/// workload's pvc collection but produces no document and no volume.
#[derive(Debug, Clone)]
pub struct PersistentVolumeClaim {
    pub name: String,
    pub namespace: Option<String>,
    pub size: String,
    pub access_modes: Vec<String>,
    pub storage_class: Option<String>,
    pub enabled: bool,
}

impl PersistentVolumeClaim {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            size: "10Gi".to_string(),
            access_modes: vec!["ReadWriteOnce".to_string()],
            storage_class: None,
            enabled: true,
        }
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn access_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_modes = modes.into_iter().map(Into::into).collect();
        self
    }

    pub fn storage_class(mut self, class: impl Into<String>) -> Self {
        self.storage_class = Some(class.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn spec(&self) -> Value {
        let mut spec = Map::new();
        spec.insert("accessModes".to_string(), json!(self.access_modes));
        spec.insert("resources".to_string(), json!({"requests": {"storage": self.size}}));
        if let Some(class) = &self.storage_class {
            spec.insert("storageClassName".to_string(), Value::String(class.clone()));
        }
        Value::Object(spec)
    }

    /// Standalone document, or None when disabled
    pub(crate) fn render(&self) -> Option<Document> {
        if !self.enabled {
            return None;
        }
        let mut metadata = Map::new();
        metadata.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(ns) = &self.namespace {
            metadata.insert("namespace".to_string(), Value::String(ns.clone()));
        }
        Some(json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": metadata,
            "spec": self.spec(),
        }))
    }

    /// StatefulSet volumeClaimTemplate entry
    pub(crate) fn render_template(&self) -> Value {
        json!({
            "metadata": {"name": self.name},
            "spec": self.spec(),
        })
    }
}

// ─────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────

/// Service port leaf, used inside a Service scope
#[derive(Debug, Clone)]
pub struct ServicePort {
    pub port: u16,
    pub target_port: Option<u16>,
    pub name: Option<String>,
    pub protocol: String,
    pub node_port: Option<u16>,
}

impl ServicePort {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            target_port: None,
            name: None,
            protocol: "TCP".to_string(),
            node_port: None,
        }
    }

    pub fn target_port(mut self, target: u16) -> Self {
        self.target_port = Some(target);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn node_port(mut self, node_port: u16) -> Self {
        self.node_port = Some(node_port);
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut spec = Map::new();
        spec.insert("port".to_string(), json!(self.port));
        spec.insert("targetPort".to_string(), json!(self.target_port.unwrap_or(self.port)));
        spec.insert("protocol".to_string(), Value::String(self.protocol.clone()));
        if let Some(name) = &self.name {
            spec.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(node_port) = &self.node_port {
            spec.insert("nodePort".to_string(), json!(node_port));
        }
        Value::Object(spec)
    }
}

/// Kubernetes Service. Built either as a single-port leaf
/// ([`Service::with_port`] registered via `Context::service`) or as an open
/// scope ([`Service::new`] via `Context::service_scope`) that accepts
/// ServicePort leaf calls. Both converge on the same render path.
#[derive(Debug, Clone)]
pub struct Service {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub service_type: String,
    pub selector: IndexMap<String, String>,
    pub(crate) ports: Vec<Value>,
}

impl Service {
    /// Scope-mode constructor: no ports yet, filled by ServicePort leaves
    pub fn new() -> Self {
        Self {
            name: None,
            namespace: None,
            service_type: "ClusterIP".to_string(),
            selector: IndexMap::new(),
            ports: Vec::new(),
        }
    }

    /// Leaf-mode constructor: a single port, registered immediately
    pub fn with_port(port: u16) -> Self {
        let mut svc = Self::new();
        svc.ports.push(json!({"port": port, "targetPort": port}));
        svc
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn selector(mut self, selector: IndexMap<String, String>) -> Self {
        self.selector = selector;
        self
    }

    pub(crate) fn render(&self) -> Document {
        let mut metadata = Map::new();
        metadata.insert(
            "name".to_string(),
            Value::String(self.name.clone().unwrap_or_else(|| "unnamed".to_string())),
        );
        if let Some(ns) = &self.namespace {
            metadata.insert("namespace".to_string(), Value::String(ns.clone()));
        }
        json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": metadata,
            "spec": {
                "type": self.service_type,
                "selector": string_map_value(&self.selector),
                "ports": self.ports,
            },
        })
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// ConfigMap / Secret
// ─────────────────────────────────────────────

/// ConfigMap, usable as a leaf (inline data) or as a scope taking Data
/// leaf calls. Identical final key sets render identically either way.
#[derive(Debug, Clone)]
pub struct ConfigMap {
    pub(crate) metadata: Metadata,
    pub(crate) data: IndexMap<String, String>,
}

impl ConfigMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(name),
            data: IndexMap::new(),
        }
    }

    pub fn data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in data {
            self.data.insert(k.into(), v.into());
        }
        self
    }

    pub(crate) fn render(&self) -> Document {
        json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": self.metadata.render(),
            "data": string_map_value(&self.data),
        })
    }
}

/// Secret. `data` entries are base64-encoded at render time; `string_data`
/// entries pass through unencoded.
#[derive(Debug, Clone)]
pub struct Secret {
    pub(crate) metadata: Metadata,
    pub(crate) data: IndexMap<String, String>,
    pub(crate) string_data: IndexMap<String, String>,
    pub secret_type: String,
}

impl Secret {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(name),
            data: IndexMap::new(),
            string_data: IndexMap::new(),
            secret_type: "Opaque".to_string(),
        }
    }

    pub fn data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in data {
            self.data.insert(k.into(), v.into());
        }
        self
    }

    pub fn string_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in data {
            self.string_data.insert(k.into(), v.into());
        }
        self
    }

    pub fn secret_type(mut self, secret_type: impl Into<String>) -> Self {
        self.secret_type = secret_type.into();
        self
    }

    pub(crate) fn render(&self) -> Document {
        use base64::Engine as _;

        let mut doc = Map::new();
        doc.insert("apiVersion".to_string(), json!("v1"));
        doc.insert("kind".to_string(), json!("Secret"));
        doc.insert("metadata".to_string(), self.metadata.render());
        doc.insert("type".to_string(), Value::String(self.secret_type.clone()));
        if !self.data.is_empty() {
            let mut data = Map::new();
            for (k, v) in &self.data {
                let encoded = base64::engine::general_purpose::STANDARD.encode(v.as_bytes());
                data.insert(k.clone(), Value::String(encoded));
            }
            doc.insert("data".to_string(), Value::Object(data));
        }
        if !self.string_data.is_empty() {
            doc.insert("stringData".to_string(), string_map_value(&self.string_data));
        }
        Value::Object(doc)
    }
}

// ─────────────────────────────────────────────
// Ingress
// ─────────────────────────────────────────────

/// Ingress rule leaf, grouped by host inside the owning Ingress
#[derive(Debug, Clone)]
pub struct IngressRule {
    pub path: String,
    pub service_name: String,
    pub service_port: u16,
    pub host: Option<String>,
    pub path_type: String,
}

impl IngressRule {
    pub fn new(path: impl Into<String>, service_name: impl Into<String>, service_port: u16) -> Self {
        Self {
            path: path.into(),
            service_name: service_name.into(),
            service_port,
            host: None,
            path_type: "Prefix".to_string(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn path_type(mut self, path_type: impl Into<String>) -> Self {
        self.path_type = path_type.into();
        self
    }

    pub(crate) fn render_path(&self) -> Value {
        json!({
            "path": self.path,
            "pathType": self.path_type,
            "backend": {
                "service": {
                    "name": self.service_name,
                    "port": {"number": self.service_port},
                }
            },
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RuleGroup {
    pub(crate) host: Option<String>,
    pub(crate) paths: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct Ingress {
    pub(crate) metadata: Metadata,
    pub host: Option<String>,
    pub tls: bool,
    pub tls_secret: Option<String>,
    pub ingress_class: String,
    pub(crate) rules: Vec<RuleGroup>,
}

impl Ingress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(name),
            host: None,
            tls: false,
            tls_secret: None,
            ingress_class: "nginx".to_string(),
            rules: Vec::new(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn tls_secret(mut self, secret: impl Into<String>) -> Self {
        self.tls_secret = Some(secret.into());
        self
    }

    pub fn ingress_class(mut self, class: impl Into<String>) -> Self {
        self.ingress_class = class.into();
        self
    }

    pub fn annotations(mut self, annotations: IndexMap<String, String>) -> Self {
        self.metadata.annotations = annotations;
        self
    }

    /// Add a rule, appending the path to an existing host group when one
    /// exists. Group order is first-appearance-per-host; paths keep
    /// insertion order within a group.
    pub(crate) fn add_rule(&mut self, rule: IngressRule) {
        let host = rule.host.clone().or_else(|| self.host.clone());
        let path = rule.render_path();
        if let Some(group) = self.rules.iter_mut().find(|g| g.host == host) {
            group.paths.push(path);
            return;
        }
        self.rules.push(RuleGroup {
            host,
            paths: vec![path],
        });
    }

    pub(crate) fn render(&self) -> Document {
        let rules: Vec<Value> = self
            .rules
            .iter()
            .map(|group| {
                let mut rule = Map::new();
                if let Some(host) = &group.host {
                    rule.insert("host".to_string(), Value::String(host.clone()));
                }
                rule.insert("http".to_string(), json!({"paths": group.paths}));
                Value::Object(rule)
            })
            .collect();

        let mut spec = Map::new();
        spec.insert("ingressClassName".to_string(), Value::String(self.ingress_class.clone()));
        spec.insert("rules".to_string(), Value::Array(rules));
        if self.tls {
            if let Some(host) = &self.host {
                let secret = self
                    .tls_secret
                    .clone()
                    .unwrap_or_else(|| format!("{}-tls", self.metadata.name));
                spec.insert("tls".to_string(), json!([{"hosts": [host], "secretName": secret}]));
            }
        }

        json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": self.metadata.render(),
            "spec": Value::Object(spec),
        })
    }
}

// ─────────────────────────────────────────────
// Workloads
// ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Deployment {
    pub(crate) metadata: Metadata,
    pub replicas: i64,
    pub(crate) labels: IndexMap<String, String>,
    pub(crate) pod_labels: IndexMap<String, String>,
    pub(crate) containers: Vec<Container>,
    pub(crate) volumes: Vec<Value>,
    pub(crate) services: Vec<Service>,
    pub(crate) pvcs: Vec<PersistentVolumeClaim>,
}

impl Deployment {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut labels = IndexMap::new();
        labels.insert("app".to_string(), name.clone());
        Self {
            metadata: Metadata::new(&name),
            replicas: 1,
            labels,
            pod_labels: IndexMap::new(),
            containers: Vec::new(),
            volumes: Vec::new(),
            services: Vec::new(),
            pvcs: Vec::new(),
        }
    }

    pub fn replicas(mut self, replicas: i64) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn labels(mut self, labels: IndexMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    pub fn annotations(mut self, annotations: IndexMap<String, String>) -> Self {
        self.metadata.annotations = annotations;
        self
    }

    /// Adopted services, in adoption order
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Adopted claims, including disabled ones
    pub fn pvcs(&self) -> &[PersistentVolumeClaim] {
        &self.pvcs
    }

    pub(crate) fn adopt(&mut self, child: Resource) -> Result<()> {
        match child {
            Resource::Service(mut svc) => {
                // Selector snapshot happens here, not at render time
                if svc.selector.is_empty() {
                    svc.selector = self.pod_labels.clone();
                }
                self.services.push(svc);
                Ok(())
            }
            Resource::PersistentVolumeClaim(pvc) => {
                if pvc.enabled {
                    self.volumes.push(json!({
                        "name": pvc.name,
                        "persistentVolumeClaim": {"claimName": pvc.name},
                    }));
                }
                self.pvcs.push(pvc);
                Ok(())
            }
            other => Err(CoreError::Adoption {
                child: other.kind(),
                parent: "Deployment",
            }),
        }
    }

    pub(crate) fn render(&self) -> Document {
        let mut pod_spec = Map::new();
        pod_spec.insert(
            "containers".to_string(),
            Value::Array(self.containers.iter().map(Container::render).collect()),
        );
        if !self.volumes.is_empty() {
            pod_spec.insert("volumes".to_string(), Value::Array(self.volumes.clone()));
        }

        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": self.metadata.render(),
            "spec": {
                "replicas": self.replicas,
                "selector": {"matchLabels": string_map_value(&self.labels)},
                "template": {
                    "metadata": {"labels": string_map_value(&self.pod_labels)},
                    "spec": Value::Object(pod_spec),
                },
            },
        })
    }

    pub(crate) fn render_all(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.pvcs.iter().filter_map(|pvc| pvc.render()).collect();
        docs.push(self.render());
        docs.extend(self.services.iter().map(Service::render));
        docs
    }
}

#[derive(Debug, Clone)]
pub struct StatefulSet {
    pub(crate) metadata: Metadata,
    pub replicas: i64,
    pub service_name: String,
    pub(crate) labels: IndexMap<String, String>,
    pub(crate) pod_labels: IndexMap<String, String>,
    pub(crate) containers: Vec<Container>,
    pub(crate) volumes: Vec<Value>,
    pub(crate) services: Vec<Service>,
    pub(crate) pvcs: Vec<PersistentVolumeClaim>,
}

impl StatefulSet {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut labels = IndexMap::new();
        labels.insert("app".to_string(), name.clone());
        Self {
            metadata: Metadata::new(&name),
            replicas: 1,
            service_name: name,
            labels,
            pod_labels: IndexMap::new(),
            containers: Vec::new(),
            volumes: Vec::new(),
            services: Vec::new(),
            pvcs: Vec::new(),
        }
    }

    pub fn replicas(mut self, replicas: i64) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn labels(mut self, labels: IndexMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    pub fn pvcs(&self) -> &[PersistentVolumeClaim] {
        &self.pvcs
    }

    pub(crate) fn adopt(&mut self, child: Resource) -> Result<()> {
        match child {
            Resource::Service(mut svc) => {
                if svc.selector.is_empty() {
                    svc.selector = self.pod_labels.clone();
                }
                self.services.push(svc);
                Ok(())
            }
            // A StatefulSet claim becomes a volumeClaimTemplate entry
            Resource::PersistentVolumeClaim(pvc) => {
                self.pvcs.push(pvc);
                Ok(())
            }
            other => Err(CoreError::Adoption {
                child: other.kind(),
                parent: "StatefulSet",
            }),
        }
    }

    pub(crate) fn render(&self) -> Document {
        let mut pod_spec = Map::new();
        pod_spec.insert(
            "containers".to_string(),
            Value::Array(self.containers.iter().map(Container::render).collect()),
        );
        if !self.volumes.is_empty() {
            pod_spec.insert("volumes".to_string(), Value::Array(self.volumes.clone()));
        }

        let mut spec = Map::new();
        spec.insert("replicas".to_string(), json!(self.replicas));
        spec.insert("serviceName".to_string(), Value::String(self.service_name.clone()));
        spec.insert("selector".to_string(), json!({"matchLabels": string_map_value(&self.labels)}));
        spec.insert(
            "template".to_string(),
            json!({
                "metadata": {"labels": string_map_value(&self.pod_labels)},
                "spec": Value::Object(pod_spec),
            }),
        );
        let templates: Vec<Value> = self
            .pvcs
            .iter()
            .filter(|pvc| pvc.enabled)
            .map(PersistentVolumeClaim::render_template)
            .collect();
        if !templates.is_empty() {
            spec.insert("volumeClaimTemplates".to_string(), Value::Array(templates));
        }

        json!({
            "apiVersion": "apps/v1",
            "kind": "StatefulSet",
            "metadata": self.metadata.render(),
            "spec": Value::Object(spec),
        })
    }

    pub(crate) fn render_all(&self) -> Vec<Document> {
        let mut docs = vec![self.render()];
        docs.extend(self.services.iter().map(Service::render));
        docs
    }
}

#[derive(Debug, Clone)]
pub struct CronJob {
    pub(crate) metadata: Metadata,
    pub schedule: String,
    pub restart_policy: String,
    pub(crate) containers: Vec<Container>,
    pub(crate) volumes: Vec<Value>,
}

impl CronJob {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(name),
            schedule: schedule.into(),
            restart_policy: "OnFailure".to_string(),
            containers: Vec::new(),
            volumes: Vec::new(),
        }
    }

    pub fn restart_policy(mut self, policy: impl Into<String>) -> Self {
        self.restart_policy = policy.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    pub(crate) fn render(&self) -> Document {
        let mut pod_spec = Map::new();
        pod_spec.insert(
            "containers".to_string(),
            Value::Array(self.containers.iter().map(Container::render).collect()),
        );
        pod_spec.insert("restartPolicy".to_string(), Value::String(self.restart_policy.clone()));
        if !self.volumes.is_empty() {
            pod_spec.insert("volumes".to_string(), Value::Array(self.volumes.clone()));
        }

        json!({
            "apiVersion": "batch/v1",
            "kind": "CronJob",
            "metadata": self.metadata.render(),
            "spec": {
                "schedule": self.schedule,
                "jobTemplate": {
                    "spec": {
                        "template": {"spec": Value::Object(pod_spec)}
                    }
                },
            },
        })
    }
}

// ─────────────────────────────────────────────
// Closed resource set
// ─────────────────────────────────────────────

/// Every top-level resource kind the render context can collect
#[derive(Debug, Clone)]
pub enum Resource {
    Namespace(Namespace),
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    CronJob(CronJob),
    Service(Service),
    ConfigMap(ConfigMap),
    Secret(Secret),
    Ingress(Ingress),
    PersistentVolumeClaim(PersistentVolumeClaim),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Namespace(_) => "Namespace",
            Resource::Deployment(_) => "Deployment",
            Resource::StatefulSet(_) => "StatefulSet",
            Resource::CronJob(_) => "CronJob",
            Resource::Service(_) => "Service",
            Resource::ConfigMap(_) => "ConfigMap",
            Resource::Secret(_) => "Secret",
            Resource::Ingress(_) => "Ingress",
            Resource::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
        }
    }

    /// This resource plus its dependent documents, in output order:
    /// supporting PVCs first, the primary document, Services after.
    /// Suppressed documents (disabled PVCs) are dropped.
    pub fn render_all(&self) -> Vec<Document> {
        match self {
            Resource::Namespace(ns) => vec![ns.render()],
            Resource::Deployment(d) => d.render_all(),
            Resource::StatefulSet(s) => s.render_all(),
            Resource::CronJob(j) => vec![j.render()],
            Resource::Service(svc) => vec![svc.render()],
            Resource::ConfigMap(cm) => vec![cm.render()],
            Resource::Secret(secret) => vec![secret.render()],
            Resource::Ingress(ing) => vec![ing.render()],
            Resource::PersistentVolumeClaim(pvc) => pvc.render().into_iter().collect(),
        }
    }
}
