//! Bow Core - Resource model and render context for the bow composition engine
//!
//! This crate provides the foundational types used throughout bow:
//! - `Context`: Explicit render context with the open-scope stack
//! - `Resource`: The closed set of top-level Kubernetes resources
//! - `Manifest`: Ordered render output with multi-document YAML export
//! - `Values`: Configuration values with deep merge support

pub mod context;
pub mod error;
pub mod manifest;
pub mod resource;
pub mod values;

pub use context::{Context, Tracking};
pub use error::{CoreError, Result};
pub use manifest::Manifest;
pub use resource::{
    ConfigMap, Container, CronJob, Deployment, Document, EnvVar, Ingress, IngressRule, Metadata,
    Namespace, PersistentVolumeClaim, Port, Probe, Resource, ResourceRequests, Secret, Service,
    ServicePort, StatefulSet, VolumeMount,
};
pub use values::{deep_merge, is_truthy, merge_all, parse_set_values, Values};
