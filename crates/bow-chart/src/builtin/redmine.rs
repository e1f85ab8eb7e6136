//! Redmine chart
//!
//! Composition example: Redmine defines its own container and pulls in
//! PostgreSQL as a declared dependency with injected defaults.

use bow_core::{
    Container, Context, Deployment, EnvVar, Ingress, IngressRule, PersistentVolumeClaim, Port,
    Probe, Result, Service, Values, VolumeMount,
};
use serde_json::json;

use crate::builtin::{opt_str, resource_requests};
use crate::chart::Chart;
use crate::dependency::ChartDependency;

/// Redmine main container component
#[allow(clippy::too_many_arguments)]
pub fn redmine_container(
    ctx: &mut Context,
    name: &str,
    image: &str,
    port: u16,
    db_host: &str,
    db_port: u16,
    db_name: &str,
    db_credentials_secret: &str,
    values: &Values,
) -> Result<()> {
    ctx.container(Container::new(name, image), |ctx| {
        ctx.port(Port::new(port).name("http"))?;

        ctx.env_var(EnvVar::literal("REDMINE_DB_POSTGRES", db_host))?;
        ctx.env_var(EnvVar::literal("REDMINE_DB_PORT", db_port.to_string()))?;
        ctx.env_var(EnvVar::literal("REDMINE_DB_DATABASE", db_name))?;
        ctx.env_var(
            EnvVar::new("REDMINE_DB_USERNAME")
                .secret(db_credentials_secret)
                .secret_key("POSTGRES_USER"),
        )?;
        ctx.env_var(
            EnvVar::new("REDMINE_DB_PASSWORD")
                .secret(db_credentials_secret)
                .secret_key("POSTGRES_PASSWORD"),
        )?;

        if let Some(requests) = resource_requests(values, "resources") {
            ctx.resources(requests)?;
        }

        ctx.volume_mount(VolumeMount::new("/usr/src/redmine/files", "redmine-files"))?;

        ctx.probe(
            "liveness",
            Probe::http_get("/", port).initial_delay(60).period(30).timeout(5),
        )?;
        ctx.probe(
            "readiness",
            Probe::http_get("/", port).initial_delay(30).period(10),
        )
    })
}

pub struct RedmineChart;

impl Chart for RedmineChart {
    fn name(&self) -> &str {
        "redmine"
    }

    fn version(&self) -> &str {
        "5.1.0"
    }

    fn description(&self) -> &str {
        "Redmine project management tool"
    }

    fn dependencies(&self) -> Vec<ChartDependency> {
        vec![ChartDependency::new("postgresql")
            .condition("postgresql.enabled")
            .default_values(Values(json!({
                "name": "redmine-db",
                "database": "redmine",
                "credentials_secret": "redmine-db-credentials",
                "storage": "20Gi",
            })))]
    }

    fn render(&self, ctx: &mut Context, values: &Values) -> crate::error::Result<()> {
        let name = values.get_str("name", "redmine");
        let image = format!("redmine:{}", values.get_str("version", "5.1"));
        let port = values.get_i64("service.port", 3000) as u16;
        let service_type = values.get_str("service.type", "ClusterIP");
        let replicas = values.get_i64("replicas", 1);

        let db_host = values.get_str("postgresql.name", "redmine-db");
        let db_name = values.get_str("postgresql.database", "redmine");
        let db_credentials =
            values.get_str("postgresql.credentials_secret", "redmine-db-credentials");

        ctx.deployment(Deployment::new(&name).replicas(replicas), |ctx| {
            redmine_container(
                ctx,
                &name,
                &image,
                port,
                &db_host,
                5432,
                &db_name,
                &db_credentials,
                values,
            )?;

            let mut pvc = PersistentVolumeClaim::new("redmine-files")
                .size(values.get_str("storage", "30Gi"));
            if let Some(class) = opt_str(values, "storage_class") {
                pvc = pvc.storage_class(class);
            }
            ctx.persistent_volume_claim(pvc)?;

            ctx.service(Service::with_port(port).service_type(&service_type))
        })?;

        if values.get_bool("ingress.enabled", false) {
            if let Some(host) = opt_str(values, "ingress.host") {
                let ingress = Ingress::new(format!("{name}-ingress"))
                    .host(host)
                    .tls(values.get_bool("ingress.tls", false))
                    .ingress_class(values.get_str("ingress.ingress_class", "nginx"));
                ctx.ingress(ingress, |ctx| {
                    ctx.ingress_rule(IngressRule::new("/", &name, port))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::chart::template;
    use crate::registry::ChartRegistry;

    fn render(set_args: &[&str]) -> Vec<serde_json::Value> {
        let registry = ChartRegistry::builtin();
        let chart = registry.get("redmine").unwrap();
        let args: Vec<String> = set_args.iter().map(|s| s.to_string()).collect();
        template(chart, &registry, &[], &args, None)
            .unwrap()
            .to_documents()
    }

    #[test]
    fn dependency_renders_by_default_with_injected_defaults() {
        let docs = render(&[]);
        let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
        // PostgreSQL dependency first, then Redmine itself
        assert_eq!(
            kinds,
            vec![
                "PersistentVolumeClaim",
                "Deployment",
                "Service",
                "PersistentVolumeClaim",
                "Deployment",
                "Service",
            ]
        );
        assert_eq!(docs[1]["metadata"]["name"], "redmine-db");
        assert_eq!(docs[0]["spec"]["resources"]["requests"]["storage"], "20Gi");
        assert_eq!(docs[4]["metadata"]["name"], "redmine");
    }

    #[test]
    fn dependency_disabled_leaves_only_redmine() {
        let docs = render(&["postgresql.enabled=false"]);
        let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["PersistentVolumeClaim", "Deployment", "Service"]);
        assert_eq!(docs[1]["metadata"]["name"], "redmine");
    }

    #[test]
    fn database_env_follows_the_dependency_overrides() {
        let docs = render(&["postgresql.name=shared-db", "postgresql.database=tracker"]);
        // The dependency deployment picks up the override
        assert_eq!(docs[1]["metadata"]["name"], "shared-db");
        let env = docs[4]["spec"]["template"]["spec"]["containers"][0]["env"]
            .as_array()
            .unwrap();
        let host = env.iter().find(|e| e["name"] == "REDMINE_DB_POSTGRES").unwrap();
        assert_eq!(host["value"], "shared-db");
        let db = env.iter().find(|e| e["name"] == "REDMINE_DB_DATABASE").unwrap();
        assert_eq!(db["value"], "tracker");
    }

    #[test]
    fn ingress_is_opt_in_and_needs_a_host() {
        let without_host = render(&["ingress.enabled=true"]);
        assert!(without_host.iter().all(|d| d["kind"] != "Ingress"));

        let docs = render(&["ingress.enabled=true", "ingress.host=redmine.example.com"]);
        let ingress = docs.iter().find(|d| d["kind"] == "Ingress").unwrap();
        assert_eq!(ingress["metadata"]["name"], "redmine-ingress");
        assert_eq!(ingress["spec"]["rules"][0]["host"], "redmine.example.com");
        let backend = &ingress["spec"]["rules"][0]["http"]["paths"][0]["backend"];
        assert_eq!(backend["service"]["name"], "redmine");
        assert_eq!(backend["service"]["port"]["number"], 3000);
    }
}
