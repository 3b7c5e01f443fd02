use serde::Serialize;
use serde_json::{json, Map, Value};
use std::io::{self, BufRead, IsTerminal, Read, Write};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".into(), Value::Bool(true));
            response.insert("message".into(), Value::String(message.to_string()));

            match data {
                Some(Value::Object(fields)) => response.extend(fields),
                Some(other) => {
                    response.insert("data".into(), other);
                }
                None => {}
            }

            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
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

/// Print any serializable value as pretty JSON
pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `key: value` lines for a flat JSON object
pub fn output_fields(value: &Value) {
    if let Some(fields) = value.as_object() {
        let width = fields.keys().map(String::len).max().unwrap_or(0);
        for (key, field) in fields {
            let rendered = match field {
                Value::Null => "-".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("{:<width$}  {}", key, rendered, width = width);
        }
    }
}

pub fn format_money(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, cents % 100)
}

/// JSON object from `--data`, or from stdin when no argument is given
pub fn read_json_input(data: Option<String>) -> anyhow::Result<Map<String, Value>> {
    let raw = match data {
        Some(raw) => raw,
        None => {
            if io::stdin().is_terminal() {
                return Err(anyhow::anyhow!("Provide --data '<json>' or pipe a JSON object on stdin"));
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(anyhow::anyhow!("Expected a JSON object")),
    }
}

/// Use the provided password or read one line from stdin
pub fn resolve_password(provided: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }

    if io::stdin().is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();

    if password.is_empty() {
        return Err(anyhow::anyhow!("Password is required"));
    }
    Ok(password)
}

/// Extract target portfolio from optional parameter or use current
pub fn resolve_portfolio(
    provided: Option<i64>,
    current_getter: impl Fn() -> anyhow::Result<Option<i64>>,
) -> anyhow::Result<Option<i64>> {
    match provided {
        Some(id) => Ok(Some(id)),
        None => current_getter(),
    }
}
