use std::path::PathBuf;
use std::str::FromStr;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::utils::{output_error, output_notice, output_routes, output_success};
use crate::cli::OutputFormat;
use crate::routes::{Notice, RouteConsole, RouteId};

const HELP: &str = "\
Commands:
  list                      show the current page
  search [term]             filter by name (no term clears)
  page <n>                  jump to page n
  toggle <id>               flip the protected flag (staged)
  protect <id> on|off       set the protected flag (staged)
  toggle-all                select-all toggle over the filtered routes (staged)
  staged                    show staged edits
  submit                    commit staged edits
  discard                   drop staged edits
  import <file>             import a CSV file
  replace                   replace routes named by pending duplicates
  skip                      skip pending duplicates
  delete <id>...            delete routes
  refresh                   reload routes
  help                      show this help
  quit                      leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    List,
    Search(String),
    Page(usize),
    Toggle(RouteId),
    Protect(RouteId, bool),
    ToggleAll,
    Staged,
    Submit,
    Discard,
    Import(PathBuf),
    Replace,
    Skip,
    Delete(Vec<RouteId>),
    Refresh,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match (word.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("list" | "ls", []) => Ok(SessionCommand::List),
            ("search", _) => Ok(SessionCommand::Search(rest.to_string())),
            ("page", [n]) => n
                .parse()
                .map(SessionCommand::Page)
                .map_err(|_| format!("Invalid page number: {}", n)),
            ("toggle", [id]) => Ok(SessionCommand::Toggle(RouteId::new(*id))),
            ("protect", [id, "on"]) => Ok(SessionCommand::Protect(RouteId::new(*id), true)),
            ("protect", [id, "off"]) => Ok(SessionCommand::Protect(RouteId::new(*id), false)),
            ("toggle-all", []) => Ok(SessionCommand::ToggleAll),
            ("staged", []) => Ok(SessionCommand::Staged),
            ("submit", []) => Ok(SessionCommand::Submit),
            ("discard", []) => Ok(SessionCommand::Discard),
            ("import", _) if !rest.is_empty() => Ok(SessionCommand::Import(PathBuf::from(rest))),
            ("replace", []) => Ok(SessionCommand::Replace),
            ("skip", []) => Ok(SessionCommand::Skip),
            ("delete", ids) if !ids.is_empty() => {
                Ok(SessionCommand::Delete(ids.iter().map(|id| RouteId::new(*id)).collect()))
            }
            ("refresh", []) => Ok(SessionCommand::Refresh),
            ("help" | "?", _) => Ok(SessionCommand::Help),
            ("quit" | "exit", []) => Ok(SessionCommand::Quit),
            ("", _) => Err("Empty command".to_string()),
            _ => Err(format!("Unrecognized command: {} (try 'help')", line)),
        }
    }
}

/// Interactive loop over stdin. Staged edits live until submitted or discarded.
pub async fn run(mut console: RouteConsole, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    output_routes(&output_format, &console)?;

    loop {
        stdout.write_all(b"routes> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(message) => {
                output_error(&output_format, &message, Some("UNKNOWN_COMMAND"))?;
                continue;
            }
        };

        if command == SessionCommand::Quit {
            break;
        }

        // Failures are reported and the session continues
        if let Err(e) = execute(&mut console, command, &output_format).await {
            output_error(&output_format, &e.to_string(), None)?;
        }
    }

    if !console.staged().is_empty() {
        tracing::warn!("Leaving session with {} unsubmitted staged edits", console.staged().len());
    }
    Ok(())
}

async fn execute(
    console: &mut RouteConsole,
    command: SessionCommand,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match command {
        SessionCommand::List => output_routes(output_format, console),
        SessionCommand::Search(term) => {
            console.set_search(term);
            output_routes(output_format, console)
        }
        SessionCommand::Page(page) => {
            console.set_page(page);
            output_routes(output_format, console)
        }
        SessionCommand::Toggle(id) => {
            let route = console.toggle_protected(&id)?;
            staged_route(output_format, &route.id, route.protected)
        }
        SessionCommand::Protect(id, protected) => {
            let route = console.set_protected(&id, protected)?;
            staged_route(output_format, &route.id, route.protected)
        }
        SessionCommand::ToggleAll => {
            let count = console.toggle_all_filtered()?;
            output_success(
                output_format,
                &format!("Staged {} routes", count),
                Some(json!({ "staged": count })),
            )
        }
        SessionCommand::Staged => {
            let edits = console.staged().commit();
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "staged": edits }))?),
                OutputFormat::Text if edits.is_empty() => println!("No staged edits"),
                OutputFormat::Text => {
                    for route in &edits {
                        println!("{}  {}  protected={}", route.id, route.name, route.protected);
                    }
                }
            }
            Ok(())
        }
        SessionCommand::Submit => {
            let notice = console.submit_changes().await;
            output_notice(output_format, &notice)
        }
        SessionCommand::Discard => output_notice(output_format, &console.discard_changes()),
        SessionCommand::Import(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
            let notice = console.import_csv(&text).await;
            output_notice(output_format, &notice)?;
            if let Notice::ImportPartial { .. } = notice {
                println!("Use 'replace' or 'skip' to resolve the duplicates");
            }
            Ok(())
        }
        SessionCommand::Replace => {
            let notice = console.replace_duplicates().await;
            output_notice(output_format, &notice)
        }
        SessionCommand::Skip => output_notice(output_format, &console.skip_duplicates()),
        SessionCommand::Delete(ids) => {
            let notice = console.delete(&ids).await;
            output_notice(output_format, &notice)
        }
        SessionCommand::Refresh => {
            console.refresh().await?;
            output_routes(output_format, console)
        }
        SessionCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
        SessionCommand::Quit => Ok(()),
    }
}

fn staged_route(output_format: &OutputFormat, id: &RouteId, protected: bool) -> anyhow::Result<()> {
    output_success(
        output_format,
        &format!("Staged route {} protected={}", id, protected),
        Some(json!({ "id": id, "protected": protected })),
    )
}
