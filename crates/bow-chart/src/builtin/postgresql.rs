//! PostgreSQL chart
//!
//! Built from reusable container and service components so other charts
//! can compose a PostgreSQL deployment without going through the chart.

use bow_core::{
    Container, Context, Deployment, EnvVar, PersistentVolumeClaim, Port, Probe, Result, Service,
    ServicePort, Values, VolumeMount,
};

use crate::builtin::{opt_str, resource_requests};
use crate::chart::Chart;

const DEFAULT_EXPORTER_IMAGE: &str = "prometheuscommunity/postgres-exporter:latest";
const METRICS_PORT: u16 = 9187;

/// PostgreSQL main container component
pub fn pg_container(
    ctx: &mut Context,
    name: &str,
    image: &str,
    port: u16,
    database: &str,
    credentials_secret: &str,
    values: &Values,
) -> Result<()> {
    ctx.container(Container::new(name, image), |ctx| {
        ctx.port(Port::new(port).name("pg"))?;

        ctx.env_var(EnvVar::literal("POSTGRES_DB", database))?;
        ctx.env_var(EnvVar::literal("PGDATA", "/var/lib/postgresql/data/pgdata"))?;
        ctx.env_var(
            EnvVar::new("POSTGRES_USER")
                .secret(credentials_secret)
                .secret_key("POSTGRES_USER"),
        )?;
        ctx.env_var(
            EnvVar::new("POSTGRES_PASSWORD")
                .secret(credentials_secret)
                .secret_key("POSTGRES_PASSWORD"),
        )?;

        if let Some(requests) = resource_requests(values, "resources") {
            ctx.resources(requests)?;
        }

        ctx.volume_mount(VolumeMount::new("/var/lib/postgresql/data", "pgdata"))?;

        if values.get_bool("probes.liveness.enabled", true) {
            ctx.probe(
                "liveness",
                Probe::tcp_socket(port)
                    .initial_delay(values.get_i64("probes.liveness.initial_delay", 30))
                    .period(values.get_i64("probes.liveness.period", 10)),
            )?;
        }
        if values.get_bool("probes.readiness.enabled", true) {
            ctx.probe(
                "readiness",
                Probe::exec(["pg_isready", "-U", "postgres"])
                    .initial_delay(values.get_i64("probes.readiness.initial_delay", 5))
                    .period(values.get_i64("probes.readiness.period", 5)),
            )?;
        }
        Ok(())
    })
}

/// Prometheus metrics exporter sidecar component
pub fn pg_metrics_sidecar(
    ctx: &mut Context,
    database: &str,
    credentials_secret: &str,
    image: &str,
) -> Result<()> {
    ctx.container(Container::new("exporter", image), |ctx| {
        ctx.port(Port::new(METRICS_PORT).name("metrics"))?;
        ctx.env_var(EnvVar::literal(
            "DATA_SOURCE_URI",
            format!("localhost:5432/{database}?sslmode=disable"),
        ))?;
        ctx.env_var(
            EnvVar::new("DATA_SOURCE_USER")
                .secret(credentials_secret)
                .secret_key("POSTGRES_USER"),
        )?;
        ctx.env_var(
            EnvVar::new("DATA_SOURCE_PASS")
                .secret(credentials_secret)
                .secret_key("POSTGRES_PASSWORD"),
        )
    })
}

/// PostgreSQL service component. With metrics enabled the service also
/// exposes the exporter port.
pub fn pg_service(ctx: &mut Context, port: u16, service_type: &str, metrics: bool) -> Result<()> {
    if metrics {
        ctx.service_scope(Service::new().service_type(service_type), |ctx| {
            ctx.service_port(ServicePort::new(port).name("pg"))?;
            ctx.service_port(ServicePort::new(METRICS_PORT).name("metrics"))
        })
    } else {
        ctx.service(Service::with_port(port).service_type(service_type))
    }
}

pub struct PostgresqlChart;

impl Chart for PostgresqlChart {
    fn name(&self) -> &str {
        "postgresql"
    }

    fn version(&self) -> &str {
        "16.4.0"
    }

    fn description(&self) -> &str {
        "PostgreSQL relational database"
    }

    fn render(&self, ctx: &mut Context, values: &Values) -> crate::error::Result<()> {
        let name = values.get_str("name", "postgresql");
        let credentials = values.get_str("credentials_secret", "pg-credentials");
        let database = values.get_str("database", "appdb");
        let image = format!("postgres:{}", values.get_str("version", "16"));
        let port = values.get_i64("service.port", 5432) as u16;
        let service_type = values.get_str("service.type", "ClusterIP");
        let metrics = values.get_bool("metrics.enabled", false);
        let replicas = values.get_i64("replicas", 1);

        ctx.deployment(Deployment::new(&name).replicas(replicas), |ctx| {
            pg_container(ctx, &name, &image, port, &database, &credentials, values)?;

            if metrics {
                let exporter_image = values.get_str("metrics.image", DEFAULT_EXPORTER_IMAGE);
                pg_metrics_sidecar(ctx, &database, &credentials, &exporter_image)?;
            }

            let mut pvc =
                PersistentVolumeClaim::new("pgdata").size(values.get_str("storage", "10Gi"));
            if let Some(class) = opt_str(values, "storage_class") {
                pvc = pvc.storage_class(class);
            }
            ctx.persistent_volume_claim(pvc)?;

            pg_service(ctx, port, &service_type, metrics)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::chart::template;
    use crate::registry::ChartRegistry;
    use serde_json::json;

    fn render(set_args: &[&str]) -> Vec<serde_json::Value> {
        let registry = ChartRegistry::builtin();
        let chart = registry.get("postgresql").unwrap();
        let args: Vec<String> = set_args.iter().map(|s| s.to_string()).collect();
        template(chart, &registry, &[], &args, None)
            .unwrap()
            .to_documents()
    }

    #[test]
    fn default_render_order_is_pvc_deployment_service() {
        let docs = render(&[]);
        let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["PersistentVolumeClaim", "Deployment", "Service"]);
        assert_eq!(docs[0]["spec"]["resources"]["requests"]["storage"], "10Gi");
        assert_eq!(docs[1]["spec"]["replicas"], 1);
        assert_eq!(docs[2]["spec"]["ports"][0]["port"], 5432);
    }

    #[test]
    fn credentials_come_from_the_secret() {
        let docs = render(&["credentials_secret=my-creds"]);
        let env = docs[1]["spec"]["template"]["spec"]["containers"][0]["env"]
            .as_array()
            .unwrap();
        let user = env.iter().find(|e| e["name"] == "POSTGRES_USER").unwrap();
        assert_eq!(user["valueFrom"]["secretKeyRef"]["name"], "my-creds");
    }

    #[test]
    fn metrics_enables_sidecar_and_second_service_port() {
        let docs = render(&["metrics.enabled=true"]);
        let containers = docs[1]["spec"]["template"]["spec"]["containers"]
            .as_array()
            .unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[1]["name"], "exporter");
        let ports = docs[2]["spec"]["ports"].as_array().unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[1]["port"], 9187);
    }

    #[test]
    fn probes_can_be_disabled_via_values() {
        let docs = render(&["probes.liveness.enabled=false"]);
        let container = &docs[1]["spec"]["template"]["spec"]["containers"][0];
        assert!(container.get("livenessProbe").is_none());
        assert_eq!(container["readinessProbe"]["exec"]["command"], json!(["pg_isready", "-U", "postgres"]));
    }
}
