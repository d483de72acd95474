use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

/// Print a command result: pretty JSON with `--json`, otherwise a colored
/// status line followed by flattened `key: value` lines.
pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(value)?;
    if is_json() {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let ok = value.get("ok").and_then(Value::as_bool).unwrap_or(true);
    let mut out = stdout();
    out.set_color(ColorSpec::new().set_fg(Some(if ok { Color::Green } else { Color::Red })).set_bold(true))?;
    write!(out, "{}", if ok { "ok" } else { "error" })?;
    out.reset()?;
    writeln!(out)?;

    for (key, val) in flatten(&value) {
        if key == "ok" {
            continue;
        }
        writeln!(out, "  {key}: {val}")?;
    }
    Ok(())
}

pub fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}

/// Flatten nested objects into dotted keys; nulls are skipped.
fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into("", value, &mut out);
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                flatten_into(&key, v, out);
            }
        }
        Value::Null => {}
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}
