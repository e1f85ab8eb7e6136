//! Collected render output

use crate::error::Result;
use crate::resource::{Document, Resource};

/// Ordered list of top-level resources produced by one manifest scope.
///
/// Resources stay inspectable in memory; document expansion (including
/// PVC-before-workload ordering and suppression of disabled claims)
/// happens in [`Manifest::to_documents`].
#[derive(Debug, Default)]
pub struct Manifest {
    resources: Vec<Resource>,
}

impl Manifest {
    pub(crate) fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Expand every resource into its output documents, in collection
    /// order. Suppressed documents are dropped entirely.
    pub fn to_documents(&self) -> Vec<Document> {
        self.resources
            .iter()
            .flat_map(Resource::render_all)
            .collect()
    }

    /// Multi-document YAML, each document prefixed with `---`.
    /// Zero documents produce an empty string.
    pub fn to_text(&self) -> Result<String> {
        let docs = self.to_documents();
        if docs.is_empty() {
            return Ok(String::new());
        }
        let mut out = String::new();
        for doc in &docs {
            out.push_str("---\n");
            out.push_str(&serde_yaml::to_string(doc)?);
        }
        Ok(out)
    }

    /// Merge another manifest's resources after this one's
    pub fn extend(&mut self, other: Manifest) {
        self.resources.extend(other.resources);
    }
}

impl FromIterator<Resource> for Manifest {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::error::Result;
    use crate::resource::{ConfigMap, Container, Deployment, Namespace};

    #[test]
    fn empty_manifest_renders_empty_string() {
        let mut ctx = Context::new();
        let manifest = ctx.manifest(|_| -> Result<()> { Ok(()) }).unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.to_text().unwrap(), "");
    }

    #[test]
    fn documents_are_separated_and_ordered() {
        let mut ctx = Context::new();
        let manifest = ctx
            .manifest(|ctx| {
                ctx.namespace(Namespace::new("apps"))?;
                ctx.deployment(Deployment::new("web"), |ctx| {
                    ctx.container(Container::new("web", "nginx:latest"), |_| Ok(()))
                })?;
                ctx.config_map(ConfigMap::new("conf"))
            })
            .unwrap();

        let text = manifest.to_text().unwrap();
        assert_eq!(text.matches("---\n").count(), 3);
        let namespace_at = text.find("kind: Namespace").unwrap();
        let deployment_at = text.find("kind: Deployment").unwrap();
        let configmap_at = text.find("kind: ConfigMap").unwrap();
        assert!(namespace_at < deployment_at);
        assert!(deployment_at < configmap_at);
    }

    #[test]
    fn nested_manifest_scopes_are_isolated() {
        let mut ctx = Context::new();
        let outer = ctx
            .manifest(|ctx| -> Result<()> {
                ctx.config_map(ConfigMap::new("outer"))?;
                let inner = ctx.manifest(|ctx| ctx.config_map(ConfigMap::new("inner")))?;
                assert_eq!(inner.resources().len(), 1);
                Ok(())
            })
            .unwrap();

        // The inner scope's resource did not leak into the outer one
        assert_eq!(outer.resources().len(), 1);
        assert_eq!(outer.to_documents()[0]["metadata"]["name"], "outer");
    }

    #[test]
    fn failed_inner_scope_restores_outer_collection() {
        let mut ctx = Context::new();
        let outer = ctx
            .manifest(|ctx| -> Result<()> {
                ctx.config_map(ConfigMap::new("outer"))?;
                let result = ctx.manifest(|ctx| {
                    ctx.config_map(ConfigMap::new("doomed"))?;
                    ctx.data("k", "v")
                });
                assert!(result.is_err());
                Ok(())
            })
            .unwrap();

        assert_eq!(outer.resources().len(), 1);
    }

    #[test]
    fn extend_appends_resources() {
        let mut ctx = Context::new();
        let mut first = ctx.manifest(|ctx| ctx.config_map(ConfigMap::new("a"))).unwrap();
        let second = ctx.manifest(|ctx| ctx.config_map(ConfigMap::new("b"))).unwrap();
        first.extend(second);
        assert_eq!(first.resources().len(), 2);
    }
}
