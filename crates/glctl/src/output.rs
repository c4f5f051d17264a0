use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use glctl_core::status::summarize;
use glctl_core::{OperationStatus, Status};
use jpx_core::Runtime;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::cli;

/// Global JMESPath runtime with extended functions
static JMESPATH_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the JMESPath runtime with extended functions
pub fn get_jmespath_runtime() -> &'static Runtime {
    JMESPATH_RUNTIME.get_or_init(|| Runtime::builder().with_all_extensions().build())
}

/// Normalize backtick literals in JMESPath expressions.
///
/// The JMESPath specification allows "elided quotes" in backtick literals,
/// meaning `` `foo` `` is equivalent to `` `"foo"` ``, but the runtime requires
/// valid JSON inside backticks.
///
/// Examples:
/// - `` `ENABLED` `` -> `` `"ENABLED"` ``
/// - `` `true` `` -> `` `true` `` (unchanged, valid JSON boolean)
/// - `` `"already quoted"` `` -> `` `"already quoted"` `` (unchanged)
fn normalize_backtick_literals(query: &str) -> String {
    static BACKTICK_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = BACKTICK_RE
        .get_or_init(|| Regex::new(r"`([^`\\]*(?:\\.[^`\\]*)*)`").ok())
        .as_ref()
    else {
        return query.to_string();
    };

    re.replace_all(query, |caps: &regex::Captures| {
        let content = &caps[1];
        let trimmed = content.trim();

        if serde_json::from_str::<Value>(trimmed).is_ok() {
            format!("`{}`", content)
        } else {
            // Unquoted string literal
            let escaped = trimmed.replace('\\', "\\\\").replace('"', "\\\"");
            format!("`\"{}\"`", escaped)
        }
    })
    .into_owned()
}

/// Compile a JMESPath expression using the extended runtime.
pub fn compile_jmespath(
    query: &str,
) -> Result<jpx_core::Expression<'static>, jpx_core::JmespathError> {
    let normalized = normalize_backtick_literals(query);
    get_jmespath_runtime().compile(&normalized)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

impl From<cli::OutputFormat> for OutputFormat {
    fn from(format: cli::OutputFormat) -> Self {
        match format {
            cli::OutputFormat::Json => OutputFormat::Json,
            cli::OutputFormat::Yaml => OutputFormat::Yaml,
            cli::OutputFormat::Auto | cli::OutputFormat::Table => OutputFormat::Table,
        }
    }
}

fn apply_query(value: Value, query: Option<&str>) -> Result<Value> {
    match query {
        Some(query_str) => {
            let expr = compile_jmespath(query_str)
                .with_context(|| format!("Invalid JMESPath expression: {}", query_str))?;
            expr.search(&value).context("JMESPath query failed")
        }
        None => Ok(value),
    }
}

pub fn print_output<T: Serialize>(
    data: T,
    format: OutputFormat,
    query: Option<&str>,
) -> Result<()> {
    let json_value = apply_query(serde_json::to_value(data)?, query)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Table => {
            print_as_table(&json_value)?;
        }
    }

    Ok(())
}

/// Print the statuses of a batch
///
/// Tables get fixed columns and a summary line; JSON and YAML carry the full
/// records, exceptions included.
pub fn print_statuses(
    statuses: &[OperationStatus],
    format: OutputFormat,
    query: Option<&str>,
) -> Result<()> {
    if format != OutputFormat::Table || query.is_some() {
        return print_output(statuses, format, query);
    }

    if statuses.is_empty() {
        println!("{}", "No items processed.".dimmed());
        return Ok(());
    }

    println!("{}", status_table(statuses));

    for status in statuses {
        if let Some(exception) = status.exception() {
            eprintln!("  {} {}: {}", "!".red(), status.name(), exception.dimmed());
        }
    }

    let summary = summarize(statuses);
    eprintln!(
        "{} complete, {} warning, {} failed",
        summary.complete.to_string().green(),
        summary.warning.to_string().yellow(),
        summary.failed.to_string().red()
    );
    Ok(())
}

fn status_table(statuses: &[OperationStatus]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Region", "ServiceType", "Status", "Details"]);

    for status in statuses {
        let color = match status.status() {
            Status::Complete => Color::Green,
            Status::Warning => Color::Yellow,
            Status::Failed => Color::Red,
        };
        table.add_row(vec![
            Cell::new(status.name()),
            Cell::new(status.region().unwrap_or("")),
            Cell::new(status.service_type().unwrap_or("")),
            Cell::new(status.status()).fg(color),
            Cell::new(status.details()),
        ]);
    }
    table
}

fn print_as_table(value: &Value) -> Result<()> {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            // Headers from the first object
            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            println!("{}", table);
        }
        Value::Array(_) => {
            println!("{}", "No items found.".dimmed());
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            println!("{}", table);
        }
        _ => {
            println!("{}", format_value(value));
        }
    }

    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => match obj.get("id").or_else(|| obj.get("name")) {
            Some(Value::String(s)) => s.clone(),
            _ => format!("{{{} fields}}", obj.len()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glctl_core::PendingStatus;
    use serde_json::json;

    #[test]
    fn test_normalize_backtick_unquoted_string() {
        assert_eq!(
            normalize_backtick_literals(r#"[?state==`ENABLED`]"#),
            r#"[?state==`"ENABLED"`]"#
        );
    }

    #[test]
    fn test_normalize_backtick_already_quoted() {
        assert_eq!(
            normalize_backtick_literals(r#"[?name==`"foo"`]"#),
            r#"[?name==`"foo"`]"#
        );
    }

    #[test]
    fn test_normalize_backtick_json_literals() {
        assert_eq!(
            normalize_backtick_literals(r#"[?count==`123`]"#),
            r#"[?count==`123`]"#
        );
        assert_eq!(
            normalize_backtick_literals(r#"[?enabled==`true`]"#),
            r#"[?enabled==`true`]"#
        );
        assert_eq!(
            normalize_backtick_literals(r#"[?value==`null`]"#),
            r#"[?value==`null`]"#
        );
    }

    #[test]
    fn test_normalize_multiple_backticks() {
        assert_eq!(
            normalize_backtick_literals(r#"[?Status==`Failed` && Region==`eu-central`]"#),
            r#"[?Status==`"Failed"` && Region==`"eu-central"`]"#
        );
    }

    #[test]
    fn test_query_over_statuses() {
        let statuses = vec![
            PendingStatus::new("a").region("eu-central").complete("ok"),
            PendingStatus::new("b")
                .region("eu-central")
                .failed("Webhook 'b' cannot be deleted!", None),
        ];
        let value = serde_json::to_value(&statuses).unwrap();
        let failed = apply_query(value, Some("[?Status==`Failed`].Name")).unwrap();
        assert_eq!(failed, json!(["b"]));
    }

    #[test]
    fn test_auto_renders_as_table() {
        assert_eq!(OutputFormat::from(cli::OutputFormat::Auto), OutputFormat::Table);
        assert_eq!(OutputFormat::from(cli::OutputFormat::Yaml), OutputFormat::Yaml);
    }

    #[test]
    fn test_status_table_columns() {
        let statuses = vec![
            PendingStatus::new("snow")
                .region("eu-central")
                .service_type("SERVICE_NOW")
                .warning("External service 'snow' already exists in the region! No action needed."),
        ];
        let rendered = status_table(&statuses).to_string();
        for column in ["Name", "Region", "ServiceType", "Status", "Details"] {
            assert!(rendered.contains(column));
        }
        assert!(rendered.contains("SERVICE_NOW"));
        assert!(rendered.contains("Warning"));
    }

    #[test]
    fn test_format_value_prefers_identifiers() {
        assert_eq!(format_value(&json!({"id": "sm-1", "name": "x"})), "sm-1");
        assert_eq!(format_value(&json!({"a": 1, "b": 2})), "{2 fields}");
        assert_eq!(format_value(&Value::Null), "");
    }
}
