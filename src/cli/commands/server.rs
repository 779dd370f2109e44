use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{
    load_environment_config, load_server_registry, ping_server, save_environment_config, save_server_registry,
    ServerInfo, ServerStatus,
};
use crate::cli::utils::{
    delete_item_with_current_check, output_current_item, output_empty_collection, output_no_current_item,
    output_success, resolve_target_item, switch_current_item,
};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Register a route API server")]
    Add {
        #[arg(help = "Server URL")]
        url: String,
        #[arg(help = "Server name (defaults to the URL host)")]
        name: Option<String>,
    },

    #[command(about = "List registered servers with last known status")]
    List,

    #[command(about = "Switch to server (persistent selection) or show current server")]
    Use {
        #[arg(help = "Server name to switch to")]
        name: Option<String>,
    },

    #[command(about = "Remove server from registry")]
    Delete {
        #[arg(help = "Server name to delete")]
        name: String,
    },

    #[command(about = "Health check a server (defaults to current server)")]
    Ping {
        #[arg(help = "Server name to ping")]
        name: Option<String>,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Add { url, name } => add(url, name, &output_format).await,
        ServerCommands::List => list(&output_format),
        ServerCommands::Use { name: Some(name) } => switch_current_item(
            &name,
            "server",
            |name| Ok(load_server_registry()?.servers.contains_key(name)),
            |name| {
                let mut env = load_environment_config()?;
                env.current_server = Some(name.to_string());
                save_environment_config(&env)
            },
            &output_format,
        ),
        ServerCommands::Use { name: None } => current(&output_format),
        ServerCommands::Delete { name } => delete_item_with_current_check(
            &name,
            "server",
            |name| Ok(load_server_registry()?.servers.contains_key(name)),
            |name| {
                let mut registry = load_server_registry()?;
                registry.servers.remove(name);
                save_server_registry(&registry)
            },
            |name| {
                let mut env = load_environment_config()?;
                if env.current_server.as_deref() == Some(name) {
                    env.current_server = None;
                    save_environment_config(&env)?;
                }
                Ok(())
            },
            &output_format,
        ),
        ServerCommands::Ping { name } => ping(name, &output_format).await,
    }
}

fn default_name(url: &str) -> anyhow::Result<String> {
    let parsed = url::Url::parse(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("Server URL has no host: {}", url))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

async fn add(url: String, name: Option<String>, output_format: &OutputFormat) -> anyhow::Result<()> {
    let name = match name {
        Some(name) => name,
        None => default_name(&url)?,
    };

    let mut registry = load_server_registry()?;
    if registry.servers.contains_key(&name) {
        return Err(anyhow::anyhow!("Server '{}' already exists", name));
    }

    let mut info = ServerInfo::new(url.clone(), String::new());
    let status = ping_server(&info).await;
    info.update_ping(status);
    if status != ServerStatus::Up {
        tracing::warn!("Server '{}' did not answer its health check", name);
    }

    registry.servers.insert(name.clone(), info);
    save_server_registry(&registry)?;

    // First server becomes current
    let mut env = load_environment_config()?;
    if env.current_server.is_none() {
        env.current_server = Some(name.clone());
        save_environment_config(&env)?;
    }

    output_success(
        output_format,
        &format!("Server '{}' added ({})", name, url),
        Some(json!({ "name": name, "url": url, "status": status })),
    )
}

fn list(output_format: &OutputFormat) -> anyhow::Result<()> {
    let registry = load_server_registry()?;
    if registry.servers.is_empty() {
        return output_empty_collection(output_format, "servers", "No servers registered");
    }

    let current = load_environment_config()?.current_server;

    match output_format {
        OutputFormat::Json => {
            let servers: Vec<_> = registry
                .servers
                .iter()
                .map(|(name, info)| {
                    json!({
                        "name": name,
                        "url": info.url,
                        "status": info.status,
                        "last_ping": info.last_ping,
                        "current": current.as_deref() == Some(name.as_str()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "servers": servers }))?);
        }
        OutputFormat::Text => {
            for (name, info) in &registry.servers {
                let marker = if current.as_deref() == Some(name.as_str()) { "*" } else { " " };
                let status = match info.status {
                    ServerStatus::Up => "up",
                    ServerStatus::Down => "down",
                    ServerStatus::Unknown => "unknown",
                };
                println!("{} {:<20} {:<40} {}", marker, name, info.url, status);
            }
        }
    }
    Ok(())
}

fn current(output_format: &OutputFormat) -> anyhow::Result<()> {
    let Some(name) = load_environment_config()?.current_server else {
        return output_no_current_item(output_format, "server");
    };

    let registry = load_server_registry()?;
    match registry.servers.get(&name) {
        Some(info) => output_current_item(output_format, "server", &name, serde_json::to_value(info)?),
        None => output_no_current_item(output_format, "server"),
    }
}

async fn ping(name: Option<String>, output_format: &OutputFormat) -> anyhow::Result<()> {
    let name = resolve_target_item(name, || Ok(load_environment_config()?.current_server), "server")?;

    let mut registry = load_server_registry()?;
    let info = registry
        .servers
        .get_mut(&name)
        .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;

    let status = ping_server(info).await;
    info.update_ping(status);
    let url = info.url.clone();
    save_server_registry(&registry)?;

    if status != ServerStatus::Up {
        return Err(anyhow::anyhow!("Server '{}' is down ({})", name, url));
    }

    output_success(
        output_format,
        &format!("Server '{}' is up", name),
        Some(json!({ "name": name, "url": url, "status": status })),
    )
}
