// src/credentials.rs
//
// Per-actor configuration delivery for the storage client
//
// `env` actors pass credentials and telemetry settings as environment
// variables on every child process. `files` actors get an isolated set of
// INI files under their own directory and point the client at them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::client::ClientEnv;
use crate::config::{ClientConfig, DeliveryMode};

/// Files written for a `files` actor, relative to the actor directory
pub const AWS_CREDENTIALS_FILE: &str = ".aws/credentials";
pub const AWS_CONFIG_FILE: &str = ".aws/config";
pub const OTEL_CONFIG_FILE: &str = ".obsctl/otel";
pub const LOKI_CONFIG_FILE: &str = ".obsctl/loki";

fn ini(section: &str, entries: &[(&str, String)]) -> String {
    let mut out = format!("[{}]\n", section);
    for (k, v) in entries {
        out.push_str(k);
        out.push_str(" = ");
        out.push_str(v);
        out.push('\n');
    }
    out
}

/// Contents of every delivery file, keyed by relative path
pub fn render_config_files(actor_id: &str, client: &ClientConfig) -> Vec<(&'static str, String)> {
    vec![
        (
            AWS_CREDENTIALS_FILE,
            ini(
                "default",
                &[
                    ("aws_access_key_id", client.access_key.clone()),
                    ("aws_secret_access_key", client.secret_key.clone()),
                ],
            ),
        ),
        (
            AWS_CONFIG_FILE,
            ini(
                "default",
                &[
                    ("region", client.region.clone()),
                    ("endpoint_url", client.endpoint.clone()),
                ],
            ),
        ),
        (
            OTEL_CONFIG_FILE,
            ini(
                "otel",
                &[
                    ("enabled", client.otel_enabled.to_string()),
                    ("endpoint", client.otlp_endpoint.clone()),
                    ("service_name", format!("obsctl-{}", actor_id)),
                ],
            ),
        ),
        (
            LOKI_CONFIG_FILE,
            ini(
                "loki",
                &[
                    ("enabled", "true".to_string()),
                    ("endpoint", client.loki_endpoint.clone()),
                    ("log_level", "info".to_string()),
                    ("label_user_id", actor_id.to_string()),
                    ("label_service", "obsctl-traffic".to_string()),
                    ("label_environment", "development".to_string()),
                ],
            ),
        ),
    ]
}

/// Write the delivery files under `actor_dir`
pub async fn write_config_files(actor_dir: &Path, actor_id: &str, client: &ClientConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (rel, contents) in render_config_files(actor_id, client) {
        let path = actor_dir.join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    debug!(actor = %actor_id, files = written.len(), "wrote client config files");
    Ok(written)
}

/// Environment overrides for every client invocation by this actor
pub fn client_env(mode: DeliveryMode, client: &ClientConfig, actor_dir: &Path) -> ClientEnv {
    match mode {
        DeliveryMode::Env => vec![
            ("AWS_ACCESS_KEY_ID".into(), client.access_key.clone()),
            ("AWS_SECRET_ACCESS_KEY".into(), client.secret_key.clone()),
            ("AWS_REGION".into(), client.region.clone()),
            ("AWS_ENDPOINT_URL".into(), client.endpoint.clone()),
            ("OTEL_ENABLED".into(), client.otel_enabled.to_string()),
            ("OTEL_EXPORTER_OTLP_ENDPOINT".into(), client.otlp_endpoint.clone()),
        ],
        DeliveryMode::Files => vec![
            (
                "AWS_CONFIG_FILE".into(),
                actor_dir.join(AWS_CONFIG_FILE).display().to_string(),
            ),
            (
                "AWS_SHARED_CREDENTIALS_FILE".into(),
                actor_dir.join(AWS_CREDENTIALS_FILE).display().to_string(),
            ),
            ("HOME".into(), actor_dir.display().to_string()),
        ],
    }
}
