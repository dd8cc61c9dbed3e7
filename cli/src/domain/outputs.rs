//! Rendering of the output-interface file (`outputs.tf`).
//!
//! The file holds exactly one `locals` block with two mappings:
//! `output_attributes` and `output_interfaces`. It is always rendered whole.

use std::fmt::Write as _;

use serde_json::{Map, Value};

/// Render the complete output-interface file.
#[must_use]
pub fn render_output_interface(attributes: &Map<String, Value>, interfaces: &Map<String, Value>) -> String {
    let mut out = String::from("locals {\n");
    render_block(&mut out, "output_attributes", attributes);
    out.push('\n');
    render_block(&mut out, "output_interfaces", interfaces);
    out.push_str("}\n");
    out
}

fn render_block(out: &mut String, name: &str, entries: &Map<String, Value>) {
    let _ = writeln!(out, "  {name} = {{");
    for (key, value) in entries {
        let _ = writeln!(out, "    {} = {}", render_key(key), render_value(value, 4));
    }
    out.push_str("  }\n");
}

/// Render one value as a Terraform expression at `indent` spaces.
#[must_use]
pub fn render_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => render_string(s),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(|v| render_value(v, indent)).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => {
            if let Some(inner) = sensitive_value(map) {
                return format!("sensitive({})", render_value(inner, indent));
            }
            if map.is_empty() {
                return "{}".to_string();
            }
            let pad = " ".repeat(indent + 2);
            let mut s = String::from("{\n");
            for (k, v) in map {
                let _ = writeln!(s, "{pad}{} = {}", render_key(k), render_value(v, indent + 2));
            }
            let _ = write!(s, "{}}}", " ".repeat(indent));
            s
        }
    }
}

/// `{ "value": X, "sensitive": true }` marks `X` as sensitive.
fn sensitive_value(map: &Map<String, Value>) -> Option<&Value> {
    if map.len() == 2 && map.get("sensitive") == Some(&Value::Bool(true)) {
        map.get("value")
    } else {
        None
    }
}

/// Dotted strings are references and stay bare; `${...}` templates and plain
/// text are quoted.
fn render_string(s: &str) -> String {
    if s.contains('.') && !s.starts_with("${") && !s.contains(char::is_whitespace) {
        s.to_string()
    } else {
        quote(s)
    }
}

fn render_key(key: &str) -> String {
    let bare = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare { key.to_string() } else { quote(key) }
}

fn quote(s: &str) -> String {
    // JSON string escaping is a subset of HCL's.
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}
