use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub url: String,
    pub description: String,
    pub added_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

/// Registered route API servers, keyed by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerRegistry {
    pub servers: BTreeMap<String, ServerInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub current_server: Option<String>,
}

impl ServerInfo {
    pub fn new(url: String, description: String) -> Self {
        Self {
            url,
            description,
            added_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("AUTHADMIN_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("authadmin").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn load_json<T: DeserializeOwned + Default>(file: &Path) -> anyhow::Result<T> {
    if !file.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(file)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_json<T: Serialize>(file: &Path, value: &T) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(file, content)?;
    Ok(())
}

pub fn load_server_registry() -> anyhow::Result<ServerRegistry> {
    load_json(&get_config_dir()?.join("server.json"))
}

pub fn save_server_registry(registry: &ServerRegistry) -> anyhow::Result<()> {
    save_json(&get_config_dir()?.join("server.json"), registry)
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    load_json(&get_config_dir()?.join("env.json"))
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    save_json(&get_config_dir()?.join("env.json"), config)
}

/// Base URL for route commands: explicit flag, then the current server,
/// then the configured default
pub fn resolve_base_url(explicit: Option<String>) -> anyhow::Result<String> {
    if let Some(url) = explicit {
        return Ok(url);
    }

    let env = load_environment_config()?;
    if let Some(name) = env.current_server {
        let registry = load_server_registry()?;
        match registry.servers.get(&name) {
            Some(server) => return Ok(server.url.clone()),
            None => tracing::warn!("Current server '{}' is not registered, using default", name),
        }
    }

    Ok(crate::config::config().api.base_url.clone())
}

pub async fn ping_server(server_info: &ServerInfo) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server_info.url.trim_end_matches('/'));

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("authadmin-cli-{}", uuid::Uuid::new_v4().simple()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = scratch_dir();
        let registry: ServerRegistry = load_json(&dir.join("server.json")).unwrap();

        assert!(registry.servers.is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn registry_round_trips_through_disk() {
        let dir = scratch_dir();
        let file = dir.join("server.json");

        let mut registry = ServerRegistry::default();
        let mut info = ServerInfo::new("http://localhost:3000".to_string(), "local".to_string());
        info.update_ping(ServerStatus::Up);
        registry.servers.insert("local".to_string(), info);
        save_json(&file, &registry).unwrap();

        let loaded: ServerRegistry = load_json(&file).unwrap();
        let local = &loaded.servers["local"];
        assert_eq!(local.url, "http://localhost:3000");
        assert_eq!(local.status, ServerStatus::Up);
        assert!(local.last_ping.is_some());

        fs::remove_dir_all(dir).unwrap();
    }
}
