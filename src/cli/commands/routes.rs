use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::config::resolve_base_url;
use crate::cli::utils::{output_notice, output_routes};
use crate::cli::OutputFormat;
use crate::client::HttpRouteStore;
use crate::config::config;
use crate::routes::{Notice, RouteConsole, RouteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicateMode {
    /// Prompt for a replace or skip decision
    Ask,
    Replace,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtectState {
    On,
    Off,
    Toggle,
}

#[derive(Subcommand)]
pub enum RoutesCommands {
    #[command(about = "List routes page by page")]
    List {
        #[arg(long, help = "Case-insensitive name filter")]
        search: Option<String>,
        #[arg(long, default_value_t = 1, help = "Page number (1-based)")]
        page: usize,
        #[arg(long, help = "Rows per page")]
        page_size: Option<usize>,
    },

    #[command(about = "Import routes from a CSV file with an id,name,created,protected header")]
    Import {
        #[arg(help = "CSV file path")]
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = DuplicateMode::Ask, help = "How to treat rows whose name already exists")]
        duplicates: DuplicateMode,
    },

    #[command(about = "Change the protected flag of routes and submit")]
    Protect {
        #[arg(required = true, help = "Route ids")]
        ids: Vec<String>,
        #[arg(long, value_enum, default_value_t = ProtectState::Toggle)]
        state: ProtectState,
    },

    #[command(about = "Select-all protect toggle over routes matching a search")]
    ProtectAll {
        #[arg(long, help = "Case-insensitive name filter")]
        search: String,
    },

    #[command(about = "Delete routes by id")]
    Delete {
        #[arg(required = true, help = "Route ids")]
        ids: Vec<String>,
    },

    #[command(about = "Interactive session with staged edits")]
    Session,
}

pub async fn handle(cmd: RoutesCommands, output_format: OutputFormat, url: Option<String>) -> anyhow::Result<()> {
    match cmd {
        RoutesCommands::List { search, page, page_size } => {
            let mut console = open_console(url, page_size).await?;
            if let Some(term) = search {
                console.set_search(term);
            }
            console.set_page(page);
            output_routes(&output_format, &console)
        }
        RoutesCommands::Import { file, duplicates } => import(url, file, duplicates, &output_format).await,
        RoutesCommands::Protect { ids, state } => {
            let mut console = open_console(url, None).await?;
            for id in ids.into_iter().map(RouteId::new) {
                let edited = match state {
                    ProtectState::On => console.set_protected(&id, true)?,
                    ProtectState::Off => console.set_protected(&id, false)?,
                    ProtectState::Toggle => console.toggle_protected(&id)?,
                };
                tracing::debug!("Staged route {} protected={}", edited.id, edited.protected);
            }
            let notice = console.submit_changes().await;
            output_notice(&output_format, &notice)
        }
        RoutesCommands::ProtectAll { search } => {
            let mut console = open_console(url, None).await?;
            console.set_search(search);
            let staged = console.toggle_all_filtered()?;
            tracing::debug!("Staged {} routes for the select-all toggle", staged);
            let notice = console.submit_changes().await;
            output_notice(&output_format, &notice)
        }
        RoutesCommands::Delete { ids } => {
            let mut console = open_console(url, None).await?;
            let ids: Vec<RouteId> = ids.into_iter().map(RouteId::new).collect();
            let notice = console.delete(&ids).await;
            output_notice(&output_format, &notice)
        }
        RoutesCommands::Session => {
            let console = open_console(url, None).await?;
            super::session::run(console, output_format).await
        }
    }
}

/// Connect to the resolved server and load the current route list
pub async fn open_console(url: Option<String>, page_size: Option<usize>) -> anyhow::Result<RouteConsole> {
    let base_url = resolve_base_url(url)?;
    let timeout = Duration::from_secs(config().api.request_timeout_secs);
    let store = HttpRouteStore::new(&base_url, timeout)?;

    let mut console = RouteConsole::new(Arc::new(store), page_size.unwrap_or(config().view.page_size));
    console.refresh().await?;
    Ok(console)
}

async fn import(
    url: Option<String>,
    file: PathBuf,
    mode: DuplicateMode,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", file.display(), e))?;

    let mut console = open_console(url, None).await?;
    let notice = console.import_csv(&text).await;
    output_notice(output_format, &notice)?;

    let Some(pending) = console.pending_duplicates() else {
        return Ok(());
    };

    let replace = match mode {
        DuplicateMode::Replace => true,
        DuplicateMode::Skip => false,
        DuplicateMode::Ask => {
            let names: Vec<&str> = pending.rows().iter().map(|row| row.name.as_str()).collect();
            confirm(&format!("Replace existing routes {}? [y/N] ", names.join(", "))).await?
        }
    };

    let notice: Notice = if replace {
        console.replace_duplicates().await
    } else {
        console.skip_duplicates()
    };
    output_notice(output_format, &notice)
}

async fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
