//! Redis chart

use bow_core::{
    Container, Context, Deployment, EnvVar, PersistentVolumeClaim, Port, Probe, Result, Service,
    Values, VolumeMount,
};

use crate::builtin::{opt_str, resource_requests};
use crate::chart::Chart;

/// Redis container component. Configuration is passed on the command
/// line; the password comes from a secret and is expanded by kubelet
/// via `$(REDIS_PASSWORD)`.
pub fn redis_container(
    ctx: &mut Context,
    name: &str,
    image: &str,
    port: u16,
    password_secret: Option<&str>,
    values: &Values,
) -> Result<()> {
    let mut command = vec!["redis-server".to_string()];
    if let Some(maxmemory) = opt_str(values, "config.maxmemory") {
        command.push("--maxmemory".to_string());
        command.push(maxmemory);
    }
    if let Some(policy) = opt_str(values, "config.maxmemory_policy") {
        command.push("--maxmemory-policy".to_string());
        command.push(policy);
    }
    if password_secret.is_some() {
        command.push("--requirepass".to_string());
        command.push("$(REDIS_PASSWORD)".to_string());
    }

    ctx.container(Container::new(name, image).command(command), |ctx| {
        ctx.port(Port::new(port).name("redis"))?;

        if let Some(secret) = password_secret {
            ctx.env_var(
                EnvVar::new("REDIS_PASSWORD")
                    .secret(secret)
                    .secret_key("REDIS_PASSWORD"),
            )?;
        }

        if let Some(requests) = resource_requests(values, "resources") {
            ctx.resources(requests)?;
        }

        ctx.volume_mount(VolumeMount::new("/data", "redis-data"))?;

        ctx.probe(
            "liveness",
            Probe::exec(["redis-cli", "ping"]).initial_delay(10).period(10),
        )?;
        ctx.probe(
            "readiness",
            Probe::exec(["redis-cli", "ping"]).initial_delay(5).period(5),
        )
    })
}

pub struct RedisChart;

impl Chart for RedisChart {
    fn name(&self) -> &str {
        "redis"
    }

    fn version(&self) -> &str {
        "7.2.0"
    }

    fn description(&self) -> &str {
        "Redis in-memory data store"
    }

    fn render(&self, ctx: &mut Context, values: &Values) -> crate::error::Result<()> {
        let name = values.get_str("name", "redis");
        let image = format!("redis:{}", values.get_str("version", "7"));
        let port = values.get_i64("service.port", 6379) as u16;
        let service_type = values.get_str("service.type", "ClusterIP");
        let password_secret = opt_str(values, "password_secret");
        let replicas = values.get_i64("replicas", 1);

        ctx.deployment(Deployment::new(&name).replicas(replicas), |ctx| {
            redis_container(ctx, &name, &image, port, password_secret.as_deref(), values)?;

            if values.get_bool("persistence.enabled", true) {
                let mut pvc = PersistentVolumeClaim::new("redis-data")
                    .size(values.get_str("storage", "5Gi"));
                if let Some(class) = opt_str(values, "storage_class") {
                    pvc = pvc.storage_class(class);
                }
                ctx.persistent_volume_claim(pvc)?;
            }

            ctx.service(Service::with_port(port).service_type(&service_type))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::chart::template;
    use crate::registry::ChartRegistry;

    fn render(set_args: &[&str]) -> Vec<serde_json::Value> {
        let registry = ChartRegistry::builtin();
        let chart = registry.get("redis").unwrap();
        let args: Vec<String> = set_args.iter().map(|s| s.to_string()).collect();
        template(chart, &registry, &[], &args, None)
            .unwrap()
            .to_documents()
    }

    #[test]
    fn default_render_has_pvc_and_service() {
        let docs = render(&[]);
        let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["PersistentVolumeClaim", "Deployment", "Service"]);
        assert_eq!(docs[0]["spec"]["resources"]["requests"]["storage"], "5Gi");
    }

    #[test]
    fn persistence_disabled_drops_the_pvc() {
        let docs = render(&["persistence.enabled=false"]);
        let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["Deployment", "Service"]);
    }

    #[test]
    fn password_secret_wires_requirepass() {
        let docs = render(&["password_secret=redis-pass"]);
        let container = &docs[1]["spec"]["template"]["spec"]["containers"][0];
        let command = container["command"].as_array().unwrap();
        assert_eq!(command.last().unwrap(), "$(REDIS_PASSWORD)");
        let env = container["env"].as_array().unwrap();
        assert_eq!(env[0]["valueFrom"]["secretKeyRef"]["name"], "redis-pass");
    }

    #[test]
    fn config_flags_extend_the_command() {
        let docs = render(&[
            "config.maxmemory=256mb",
            "config.maxmemory_policy=allkeys-lru",
        ]);
        let command = docs[1]["spec"]["template"]["spec"]["containers"][0]["command"]
            .as_array()
            .unwrap();
        let command: Vec<&str> = command.iter().map(|c| c.as_str().unwrap()).collect();
        assert_eq!(
            command,
            vec![
                "redis-server",
                "--maxmemory",
                "256mb",
                "--maxmemory-policy",
                "allkeys-lru",
            ]
        );
    }
}
