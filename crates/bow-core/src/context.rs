//! Explicit render context
//!
//! The context owns the open-scope stack and the collected top-level
//! resource list. Charts receive a `&mut Context` and never touch hidden
//! global state, so two contexts can never observe each other's
//! in-progress trees. Scopes are opened with closure-taking methods; the
//! frame is popped when the closure returns, whether it succeeded or not.
//! Leaf calls validate the innermost open scope and fail immediately when
//! it is not a compatible parent.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::{CoreError, Result};
use crate::manifest::Manifest;
use crate::resource::{
    probe_key, ConfigMap, Container, CronJob, Deployment, EnvVar, Ingress, IngressRule, Metadata,
    Namespace, PersistentVolumeClaim, Port, Probe, Resource, ResourceRequests, Secret, Service,
    ServicePort, StatefulSet, VolumeMount,
};

/// Tracking labels stamped onto resource metadata (`bow.io/*`)
#[derive(Debug, Clone, Default)]
pub struct Tracking {
    pub chart: Option<String>,
    pub version: Option<String>,
    pub stack: Option<String>,
}

impl Tracking {
    pub fn chart(chart: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            chart: Some(chart.into()),
            version: Some(version.into()),
            stack: None,
        }
    }

    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    fn labels(&self) -> IndexMap<String, String> {
        let mut labels = IndexMap::new();
        labels.insert("bow.io/managed-by".to_string(), "bow".to_string());
        if let Some(chart) = &self.chart {
            labels.insert("bow.io/chart".to_string(), chart.clone());
        }
        if let Some(version) = &self.version {
            labels.insert("bow.io/version".to_string(), version.clone());
        }
        if let Some(stack) = &self.stack {
            labels.insert("bow.io/stack".to_string(), stack.clone());
        }
        labels
    }
}

/// An open scope on the context stack
#[derive(Debug)]
enum Frame {
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    CronJob(CronJob),
    Container(Container),
    Service(Service),
    ConfigMap(ConfigMap),
    Secret(Secret),
    Ingress(Ingress),
}

impl Frame {
    fn kind(&self) -> &'static str {
        match self {
            Frame::Deployment(_) => "Deployment",
            Frame::StatefulSet(_) => "StatefulSet",
            Frame::CronJob(_) => "CronJob",
            Frame::Container(_) => "Container",
            Frame::Service(_) => "Service",
            Frame::ConfigMap(_) => "ConfigMap",
            Frame::Secret(_) => "Secret",
            Frame::Ingress(_) => "Ingress",
        }
    }

    fn name(&self) -> &str {
        match self {
            Frame::Deployment(d) => &d.metadata.name,
            Frame::StatefulSet(s) => &s.metadata.name,
            Frame::CronJob(j) => &j.metadata.name,
            Frame::Container(c) => &c.name,
            Frame::Service(svc) => svc.name.as_deref().unwrap_or("unnamed"),
            Frame::ConfigMap(cm) => &cm.metadata.name,
            Frame::Secret(s) => &s.metadata.name,
            Frame::Ingress(i) => &i.metadata.name,
        }
    }

    /// Exhaustive adoption table. Every (parent, child) pair is either
    /// accepted or rejected with an error naming both sides.
    fn adopt(&mut self, child: Adopted) -> Result<()> {
        match (self, child) {
            (Frame::Deployment(d), Adopted::Container(c)) => {
                d.containers.push(c);
                Ok(())
            }
            (Frame::StatefulSet(s), Adopted::Container(c)) => {
                s.containers.push(c);
                Ok(())
            }
            (Frame::CronJob(j), Adopted::Container(c)) => {
                j.containers.push(c);
                Ok(())
            }
            (_, Adopted::Container(_)) => Err(CoreError::ScopeMismatch {
                leaf: "Container",
                expected: "a Deployment, StatefulSet or CronJob",
            }),
            (Frame::Deployment(d), Adopted::Resource(r)) => d.adopt(r),
            (Frame::StatefulSet(s), Adopted::Resource(r)) => s.adopt(r),
            (frame, Adopted::Resource(r)) => Err(CoreError::Adoption {
                child: r.kind(),
                parent: frame.kind(),
            }),
        }
    }
}

enum Adopted {
    Container(Container),
    Resource(Resource),
}

/// Render context: scope stack, collected top-level resources, tracking
/// labels and an optional default namespace.
#[derive(Debug, Default)]
pub struct Context {
    stack: Vec<Frame>,
    collected: Vec<Resource>,
    tracking: Tracking,
    namespace: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tracking labels for subsequently constructed resources
    pub fn set_tracking(&mut self, tracking: Tracking) {
        self.tracking = tracking;
    }

    /// Default namespace applied to resource metadata
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = Some(namespace.into());
    }

    /// Clear stack and collected list. Test harness use only.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.collected.clear();
    }

    fn tracking_labels(&self) -> IndexMap<String, String> {
        if self.tracking.chart.is_none()
            && self.tracking.version.is_none()
            && self.tracking.stack.is_none()
        {
            return IndexMap::new();
        }
        self.tracking.labels()
    }

    fn apply_namespace(&self, metadata: &mut Metadata) {
        if metadata.namespace.is_none() {
            metadata.namespace = self.namespace.clone();
        }
    }

    // ─────────────────────────────────────────
    // Manifest scope
    // ─────────────────────────────────────────

    /// Collect every top-level resource produced inside the closure.
    ///
    /// The previously collected list is restored on exit, so nested
    /// manifest scopes never leak resources into each other. The error
    /// type is the closure's own, so callers layering richer errors on
    /// top of [`CoreError`] can use the scope directly.
    pub fn manifest<F, E>(&mut self, body: F) -> std::result::Result<Manifest, E>
    where
        F: FnOnce(&mut Context) -> std::result::Result<(), E>,
    {
        let outer = std::mem::take(&mut self.collected);
        let result = body(self);
        let inner = std::mem::replace(&mut self.collected, outer);
        result.map(|_| Manifest::new(inner))
    }

    // ─────────────────────────────────────────
    // Scope plumbing
    // ─────────────────────────────────────────

    fn scoped<F>(&mut self, frame: Frame, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        self.stack.push(frame);
        let result = body(self);
        // The pop is unconditional; scope methods keep push/pop balanced.
        match (self.stack.pop(), result) {
            (Some(frame), Ok(())) => self.finish(frame),
            (_, Err(err)) => Err(err),
            (None, Ok(())) => Ok(()),
        }
    }

    fn finish(&mut self, frame: Frame) -> Result<()> {
        match frame {
            Frame::Container(c) => match self.stack.last_mut() {
                Some(parent) => parent.adopt(Adopted::Container(c)),
                None => Err(CoreError::ScopeMismatch {
                    leaf: "Container",
                    expected: "a Deployment, StatefulSet or CronJob",
                }),
            },
            Frame::Deployment(d) => self.register(Resource::Deployment(d)),
            Frame::StatefulSet(s) => self.register(Resource::StatefulSet(s)),
            Frame::CronJob(j) => self.register(Resource::CronJob(j)),
            Frame::Service(svc) => self.register(Resource::Service(svc)),
            Frame::ConfigMap(cm) => self.register(Resource::ConfigMap(cm)),
            Frame::Secret(s) => self.register(Resource::Secret(s)),
            Frame::Ingress(i) => self.register(Resource::Ingress(i)),
        }
    }

    fn register(&mut self, resource: Resource) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => parent.adopt(Adopted::Resource(resource)),
            None => {
                self.collected.push(resource);
                Ok(())
            }
        }
    }

    fn enclosing_name(&self) -> Option<String> {
        self.stack.last().map(|frame| frame.name().to_string())
    }

    // ─────────────────────────────────────────
    // Scope openers
    // ─────────────────────────────────────────

    pub fn deployment<F>(&mut self, mut dep: Deployment, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        dep.pod_labels = dep.labels.clone();
        dep.pod_labels.extend(self.tracking_labels());
        dep.metadata.labels = dep.pod_labels.clone();
        self.apply_namespace(&mut dep.metadata);
        self.scoped(Frame::Deployment(dep), body)
    }

    pub fn stateful_set<F>(&mut self, mut sts: StatefulSet, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        sts.pod_labels = sts.labels.clone();
        sts.pod_labels.extend(self.tracking_labels());
        sts.metadata.labels = sts.pod_labels.clone();
        self.apply_namespace(&mut sts.metadata);
        self.scoped(Frame::StatefulSet(sts), body)
    }

    pub fn cron_job<F>(&mut self, mut job: CronJob, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        job.metadata.labels.extend(self.tracking_labels());
        self.apply_namespace(&mut job.metadata);
        self.scoped(Frame::CronJob(job), body)
    }

    pub fn container<F>(&mut self, container: Container, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        if !matches!(
            self.stack.last(),
            Some(Frame::Deployment(_) | Frame::StatefulSet(_) | Frame::CronJob(_))
        ) {
            return Err(CoreError::ScopeMismatch {
                leaf: "Container",
                expected: "a Deployment, StatefulSet or CronJob",
            });
        }
        self.scoped(Frame::Container(container), body)
    }

    /// Open a multi-port Service scope; ports come from ServicePort leaves
    pub fn service_scope<F>(&mut self, mut svc: Service, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        if svc.name.is_none() {
            svc.name = Some(self.enclosing_name().unwrap_or_else(|| "unnamed".to_string()));
        }
        if svc.namespace.is_none() {
            svc.namespace = self.namespace.clone();
        }
        self.scoped(Frame::Service(svc), body)
    }

    pub fn config_map_scope<F>(&mut self, mut cm: ConfigMap, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        self.apply_namespace(&mut cm.metadata);
        self.scoped(Frame::ConfigMap(cm), body)
    }

    pub fn secret_scope<F>(&mut self, mut secret: Secret, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        self.apply_namespace(&mut secret.metadata);
        self.scoped(Frame::Secret(secret), body)
    }

    pub fn ingress<F>(&mut self, mut ing: Ingress, body: F) -> Result<()>
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        ing.metadata.labels.extend(self.tracking_labels());
        self.apply_namespace(&mut ing.metadata);
        self.scoped(Frame::Ingress(ing), body)
    }

    // ─────────────────────────────────────────
    // Leaf resources
    // ─────────────────────────────────────────

    pub fn namespace(&mut self, mut ns: Namespace) -> Result<()> {
        ns.metadata.labels.extend(self.tracking_labels());
        self.register(Resource::Namespace(ns))
    }

    /// Register a single-port Service immediately (leaf mode)
    pub fn service(&mut self, mut svc: Service) -> Result<()> {
        if svc.name.is_none() {
            svc.name = Some(self.enclosing_name().unwrap_or_else(|| "unnamed".to_string()));
        }
        if svc.namespace.is_none() {
            svc.namespace = self.namespace.clone();
        }
        self.register(Resource::Service(svc))
    }

    pub fn config_map(&mut self, mut cm: ConfigMap) -> Result<()> {
        self.apply_namespace(&mut cm.metadata);
        self.register(Resource::ConfigMap(cm))
    }

    pub fn secret(&mut self, mut secret: Secret) -> Result<()> {
        self.apply_namespace(&mut secret.metadata);
        self.register(Resource::Secret(secret))
    }

    pub fn persistent_volume_claim(&mut self, mut pvc: PersistentVolumeClaim) -> Result<()> {
        if pvc.namespace.is_none() {
            pvc.namespace = self.namespace.clone();
        }
        self.register(Resource::PersistentVolumeClaim(pvc))
    }

    // ─────────────────────────────────────────
    // Container leaves
    // ─────────────────────────────────────────

    fn current_container(&mut self, leaf: &'static str) -> Result<&mut Container> {
        match self.stack.last_mut() {
            Some(Frame::Container(c)) => Ok(c),
            _ => Err(CoreError::ScopeMismatch {
                leaf,
                expected: "a Container",
            }),
        }
    }

    pub fn port(&mut self, port: Port) -> Result<()> {
        let rendered = port.render();
        self.current_container("Port")?.ports.push(rendered);
        Ok(())
    }

    pub fn env_var(&mut self, env: EnvVar) -> Result<()> {
        let rendered = env.render();
        self.current_container("EnvVar")?.env.push(rendered);
        Ok(())
    }

    pub fn resources(&mut self, requests: ResourceRequests) -> Result<()> {
        let rendered = requests.render();
        self.current_container("Resources")?.resources = Some(rendered);
        Ok(())
    }

    pub fn volume_mount(&mut self, mount: VolumeMount) -> Result<()> {
        let rendered = mount.render();
        self.current_container("VolumeMount")?
            .volume_mounts
            .push(rendered);
        Ok(())
    }

    pub fn probe(&mut self, kind: &str, probe: Probe) -> Result<()> {
        let key = probe_key(kind)?;
        let rendered = probe.render();
        self.current_container("Probe")?.probes.insert(key, rendered);
        Ok(())
    }

    // ─────────────────────────────────────────
    // Service / ConfigMap / Secret / Ingress leaves
    // ─────────────────────────────────────────

    pub fn service_port(&mut self, port: ServicePort) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Service(svc)) => {
                svc.ports.push(port.render());
                Ok(())
            }
            _ => Err(CoreError::ScopeMismatch {
                leaf: "ServicePort",
                expected: "a Service",
            }),
        }
    }

    pub fn data(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::ConfigMap(cm)) => {
                cm.data.insert(key.into(), value.into());
                Ok(())
            }
            Some(Frame::Secret(secret)) => {
                secret.data.insert(key.into(), value.into());
                Ok(())
            }
            _ => Err(CoreError::ScopeMismatch {
                leaf: "Data",
                expected: "a ConfigMap or Secret",
            }),
        }
    }

    pub fn ingress_rule(&mut self, rule: IngressRule) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Ingress(ing)) => {
                ing.add_rule(rule);
                Ok(())
            }
            _ => Err(CoreError::ScopeMismatch {
                leaf: "IngressRule",
                expected: "an Ingress",
            }),
        }
    }

    // ─────────────────────────────────────────
    // Workload volume leaves
    // ─────────────────────────────────────────

    fn push_volume(&mut self, leaf: &'static str, volume: Value) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Deployment(d)) => {
                d.volumes.push(volume);
                Ok(())
            }
            Some(Frame::StatefulSet(s)) => {
                s.volumes.push(volume);
                Ok(())
            }
            Some(Frame::CronJob(j)) => {
                j.volumes.push(volume);
                Ok(())
            }
            _ => Err(CoreError::ScopeMismatch {
                leaf,
                expected: "a Deployment, StatefulSet or CronJob",
            }),
        }
    }

    pub fn empty_dir_volume(&mut self, name: &str, medium: Option<&str>) -> Result<()> {
        let mut empty_dir = serde_json::Map::new();
        if let Some(medium) = medium {
            empty_dir.insert("medium".to_string(), Value::String(medium.to_string()));
        }
        self.push_volume(
            "EmptyDirVolume",
            json!({"name": name, "emptyDir": Value::Object(empty_dir)}),
        )
    }

    pub fn config_map_volume(&mut self, name: &str, configmap_name: &str) -> Result<()> {
        self.push_volume(
            "ConfigMapVolume",
            json!({"name": name, "configMap": {"name": configmap_name}}),
        )
    }

    pub fn secret_volume(&mut self, name: &str, secret_name: &str) -> Result<()> {
        self.push_volume(
            "SecretVolume",
            json!({"name": name, "secret": {"secretName": secret_name}}),
        )
    }
}
