use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::routes::{Notice, RouteConsole};

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Output current item information in the appropriate format
pub fn output_current_item(
    output_format: &OutputFormat,
    item_type: &str,
    name: &str,
    details: Value,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                format!("current_{}", item_type): details
            }))?);
        }
        OutputFormat::Text => {
            println!("Current {}: {}", item_type, name);
            if let Some(url) = details.get("url").and_then(Value::as_str) {
                println!("URL: {}", url);
            }
            if let Some(desc) = details.get("description").and_then(Value::as_str) {
                if !desc.is_empty() {
                    println!("Description: {}", desc);
                }
            }
        }
    }
    Ok(())
}

/// Output "no current item" message in the appropriate format
pub fn output_no_current_item(output_format: &OutputFormat, item_type: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                format!("current_{}", item_type): null
            }))?);
        }
        OutputFormat::Text => {
            println!("No current {} set", item_type);
        }
    }
    Ok(())
}

/// Switch the persistent selection to an existing item
pub fn switch_current_item<F, G>(
    item_name: &str,
    item_type: &str,
    check_exists: F,
    update_current: G,
    output_format: &OutputFormat,
) -> anyhow::Result<()>
where
    F: Fn(&str) -> anyhow::Result<bool>,
    G: Fn(&str) -> anyhow::Result<()>,
{
    if !check_exists(item_name)? {
        return Err(anyhow::anyhow!("{} '{}' not found", capitalize(item_type), item_name));
    }

    update_current(item_name)?;

    output_success(
        output_format,
        &format!("Switched to {} '{}'", item_type, item_name),
        Some(json!({ format!("current_{}", item_type): item_name })),
    )
}

/// Delete an item and clear the current selection if it pointed at it
pub fn delete_item_with_current_check<F, G, H>(
    item_name: &str,
    item_type: &str,
    check_exists: F,
    remove_item: G,
    clear_if_current: H,
    output_format: &OutputFormat,
) -> anyhow::Result<()>
where
    F: Fn(&str) -> anyhow::Result<bool>,
    G: Fn(&str) -> anyhow::Result<()>,
    H: Fn(&str) -> anyhow::Result<()>,
{
    if !check_exists(item_name)? {
        return Err(anyhow::anyhow!("{} '{}' not found", capitalize(item_type), item_name));
    }

    remove_item(item_name)?;
    clear_if_current(item_name)?;

    output_success(
        output_format,
        &format!("{} '{}' deleted successfully", capitalize(item_type), item_name),
        None,
    )
}

/// Extract target item name from optional parameter or use current
pub fn resolve_target_item(
    provided_name: Option<String>,
    current_getter: impl Fn() -> anyhow::Result<Option<String>>,
    item_type: &str,
) -> anyhow::Result<String> {
    match provided_name {
        Some(name) => Ok(name),
        None => current_getter()?.ok_or_else(|| anyhow::anyhow!("No current {} set", item_type)),
    }
}

/// Print a workflow notice. Failure notices become command errors.
pub fn output_notice(output_format: &OutputFormat, notice: &Notice) -> anyhow::Result<()> {
    if notice.is_failure() {
        return Err(anyhow::anyhow!("{}", notice));
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(notice)?);
        }
        OutputFormat::Text => match notice {
            Notice::Info { .. } => println!("{}", notice),
            _ => println!("✓ {}", notice),
        },
    }
    Ok(())
}

/// Print the visible page of the console with its paging and selection state
pub fn output_routes(output_format: &OutputFormat, console: &RouteConsole) -> anyhow::Result<()> {
    let visible = console.visible();
    let select_all = console.select_all_state();

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                "routes": visible,
                "search": console.search(),
                "page": console.page(),
                "page_count": console.page_count(),
                "filtered": console.filtered_count(),
                "total": console.authoritative().len(),
                "select_all": select_all,
                "staged": console.staged().len(),
            }))?);
        }
        OutputFormat::Text => {
            if visible.is_empty() {
                println!("No routes found");
            } else {
                println!("{:<36}  {:<32}  {:<25}  {}", "ID", "NAME", "CREATED", "PROTECTED");
                for route in &visible {
                    let marker = if console.staged().get(&route.id).is_some() { " *" } else { "" };
                    println!(
                        "{:<36}  {:<32}  {:<25}  {}{}",
                        route.id,
                        route.name,
                        route.created,
                        if route.protected { "yes" } else { "no" },
                        marker
                    );
                }
            }

            let protect_all = if select_all.disabled {
                "disabled"
            } else if select_all.checked {
                "all protected"
            } else if select_all.indeterminate {
                "partially protected"
            } else {
                "none protected"
            };

            println!(
                "Page {}/{}, {} of {} routes match, select all: {}",
                console.page(),
                console.page_count().max(1),
                console.filtered_count(),
                console.authoritative().len(),
                protect_all
            );
            if !console.staged().is_empty() {
                println!("{} staged edits (*) not yet submitted", console.staged().len());
            }
        }
    }
    Ok(())
}
