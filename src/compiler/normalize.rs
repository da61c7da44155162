//! Structural normalization (spec.md §4.6 step 5), applied in order to
//! the raw `serde_json::Value` tree extracted from the model's
//! response, before it is deserialized into typed [`CriterionNode`]s
//! and validated. Operating on `Value` (rather than the typed schema)
//! lets this stage repair shapes — operator aliases, a bare object
//! instead of a top-level list — that would otherwise fail to
//! deserialize at all.

use serde_json::Value;

/// Runs every pass in the order spec.md §4.6 step 5 lists them, and
/// returns the normalized top-level list of node values.
///
/// Idempotent (spec.md §8 P3): running this twice on its own output is
/// a no-op, because each pass is individually a fixed point once the
/// shapes it targets are gone.
pub fn normalize(raw: Value) -> Vec<Value> {
    let mut nodes = ensure_top_level(raw);
    for node in &mut nodes {
        unwrap_and_collapse(node);
    }
    for node in &mut nodes {
        propagate_type(node, None);
    }
    for node in &mut nodes {
        normalize_operator_aliases(node);
        normalize_units(node);
    }
    nodes
}

/// "Ensure top-level form: a list of nodes each with `type`.
/// Single-criterion inputs become single-element lists."
fn ensure_top_level(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items,
        Value::Object(_) => vec![raw],
        other => vec![other],
    }
}

fn is_group(node: &Value) -> bool {
    node.get("criteria").is_some_and(Value::is_array)
}

fn logic_operator(node: &Value) -> Option<String> {
    node.get("logic_operator")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// "Unwrap singleton groups (`{AND, [X]}` -> `X`) and collapse
/// identical nested operators (`{AND, [{AND, [X,Y]}, Z]}` -> `{AND,
/// [X,Y,Z]}`)." Recurses bottom-up so nested singletons collapse fully
/// in one pass.
fn unwrap_and_collapse(node: &mut Value) {
    if !is_group(node) {
        return;
    }

    if let Some(children) = node.get_mut("criteria").and_then(Value::as_array_mut) {
        for child in children.iter_mut() {
            unwrap_and_collapse(child);
        }
    }

    let op = logic_operator(node);
    if let Some(op) = op.as_deref()
        && op != "NOT"
    {
        flatten_identical_children(node, op);
    }

    let should_unwrap = node
        .get("logic_operator")
        .and_then(Value::as_str)
        .is_some_and(|op| op != "NOT")
        && node
            .get("criteria")
            .and_then(Value::as_array)
            .is_some_and(|c| c.len() == 1);

    if should_unwrap {
        let group_type = node.get("type").cloned();
        let mut child = node
            .get_mut("criteria")
            .and_then(Value::as_array_mut)
            .map(|c| c.remove(0))
            .expect("checked len == 1 above");
        if group_type.is_some() && child.get("type").is_none()
            && let Value::Object(map) = &mut child
        {
            map.insert("type".to_string(), group_type.unwrap());
        }
        *node = child;
    }
}

fn flatten_identical_children(node: &mut Value, op: &str) {
    let Some(Value::Array(children)) = node.get_mut("criteria") else {
        return;
    };
    let mut flattened = Vec::with_capacity(children.len());
    for child in children.drain(..) {
        if is_group(&child) && logic_operator(&child).as_deref() == Some(op) {
            if let Value::Object(map) = &child
                && let Some(Value::Array(grandchildren)) = map.get("criteria")
            {
                flattened.extend(grandchildren.iter().cloned());
                continue;
            }
        }
        flattened.push(child);
    }
    *children = flattened;
}

/// "Propagate `type` from group to children when children omit it."
fn propagate_type(node: &mut Value, inherited: Option<&str>) {
    let Value::Object(map) = node else { return };

    let own_type = map
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| inherited.map(str::to_string));

    if let Some(t) = &own_type
        && !map.contains_key("type")
    {
        map.insert("type".to_string(), Value::String(t.clone()));
    }

    if let Some(Value::Array(children)) = map.get_mut("criteria") {
        for child in children {
            propagate_type(child, own_type.as_deref());
        }
    }
}

const OPERATOR_ALIASES: &[(&str, &str)] = &[
    (">=", "greater_than_or_equal"),
    ("<=", "less_than_or_equal"),
    (">", "greater_than"),
    ("<", "less_than"),
    ("==", "equals"),
    ("=", "equals"),
    ("in", "contains"),
    ("not in", "not_contains"),
    ("present", "exists"),
    ("absent", "not_exists"),
];

/// "Normalize operator aliases (e.g., `>=` -> `greater_than_or_equal`)."
fn normalize_operator_aliases(node: &mut Value) {
    if let Value::Object(map) = node {
        if let Some(Value::String(op)) = map.get("operator") {
            let normalized = normalize_operator_alias(op);
            map.insert("operator".to_string(), Value::String(normalized));
        }
        if let Some(Value::Array(children)) = map.get_mut("criteria") {
            for child in children {
                normalize_operator_aliases(child);
            }
        }
    }
}

fn normalize_operator_alias(raw: &str) -> String {
    let trimmed = raw.trim();
    for (alias, canonical) in OPERATOR_ALIASES {
        if trimmed.eq_ignore_ascii_case(alias) {
            return canonical.to_string();
        }
    }
    trimmed.to_ascii_lowercase()
}

/// "Normalize units (strip whitespace; accept common equivalents such
/// as `%`, `mg/dL`)."
fn normalize_units(node: &mut Value) {
    if let Value::Object(map) = node {
        if let Some(Value::String(unit)) = map.get("unit") {
            let normalized = normalize_unit(unit);
            map.insert("unit".to_string(), Value::String(normalized));
        }
        if let Some(Value::Array(children)) = map.get_mut("criteria") {
            for child in children {
                normalize_units(child);
            }
        }
    }
}

fn normalize_unit(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "percent" | "pct" | "%" => "%".to_string(),
        "mg/dl" => "mg/dL".to_string(),
        "mmol/l" => "mmol/L".to_string(),
        "years" | "year" | "yrs" | "yr" => "years".to_string(),
        _ => trimmed.to_string(),
    }
}
