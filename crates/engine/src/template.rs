//! Pure `{{path}}` template substitution over a node's resolved config.
//!
//! No I/O, no handler knowledge — this module only walks a [`Value`] tree
//! and resolves dotted paths against a fixed four-root context
//! (`input`, `nodes`, `trigger`, `env`), per spec.md §4.3 step 3. Kept
//! side-effect free so it can be exercised with property-based tests.

use serde_json::{Map, Value};

/// The four namespaces a template path may start with.
#[derive(Debug, Clone, Copy)]
pub struct TemplateRoots<'a> {
    /// `{{input.*}}` — this node's resolved input data.
    pub input: &'a Value,
    /// `{{nodes.*}}` — every completed node's output, keyed by node id string.
    pub nodes: &'a Value,
    /// `{{trigger.*}}` — the payload that started the execution.
    pub trigger: &'a Value,
    /// `{{env.*}}` — flow-level settings.
    pub env: &'a Value,
}

/// Substitute every `{{path}}` token found anywhere in `config`.
///
/// A string that is *exactly* one token (e.g. `"{{input.user}}"`) is
/// replaced with the resolved value verbatim, preserving its JSON type
/// (object, array, number, ...). A string containing a token alongside
/// other text (e.g. `"hello {{input.user}}"`) has the token's resolved
/// value stringified and spliced in. Undefined paths resolve to `null`
/// and never raise an error.
#[must_use]
pub fn substitute(config: &Value, roots: TemplateRoots<'_>) -> Value {
    match config {
        Value::String(s) => substitute_string(s, roots),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| substitute(v, roots)).collect())
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), substitute(v, roots));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn substitute_string(s: &str, roots: TemplateRoots<'_>) -> Value {
    if let Some(path) = whole_token(s) {
        return resolve_path(&path, roots);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            // Unterminated token: emit the rest verbatim and stop.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let path = after_open[..end].trim();
        let resolved = resolve_path(path, roots);
        out.push_str(&value_to_display(&resolved));
        rest = &after_open[end + 2..];
    }
    out.push_str(rest);
    Value::String(out)
}

/// Returns `Some(path)` if `s` is exactly one `{{path}}` token with no
/// surrounding text, so the resolved value's type can be preserved.
fn whole_token(s: &str) -> Option<String> {
    let trimmed = s.trim();
    let inner = trimmed.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim().to_string())
}

fn resolve_path(path: &str, roots: TemplateRoots<'_>) -> Value {
    let mut segments = path.split('.');
    let Some(root_name) = segments.next() else {
        return Value::Null;
    };
    let root = match root_name {
        "input" => roots.input,
        "nodes" => roots.nodes,
        "trigger" => roots.trigger,
        "env" => roots.env,
        _ => return Value::Null,
    };
    walk(root, segments)
}

fn walk<'a>(value: &'a Value, mut segments: impl Iterator<Item = &'a str>) -> Value {
    match segments.next() {
        None => value.clone(),
        Some(segment) => match value.get(segment) {
            Some(next) => walk(next, segments),
            None => Value::Null,
        },
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
