use serde_json::{Map, Value};

pub(crate) const KEY_SEPARATOR: &str = "__";
const LIST_SEPARATOR: &str = " | ";

/// Flatten a nested JSON object into `(column, value)` pairs.
///
/// Nested keys are joined with `__`, lists of scalars become `a | b | c`, and
/// lists holding objects or lists are kept as their JSON text.
pub fn flatten_object(object: &Map<String, Value>) -> Vec<(String, String)> {
    let mut columns = Vec::new();
    flatten_into(object, "", &mut columns);
    columns
}

fn flatten_into(object: &Map<String, Value>, parent: &str, columns: &mut Vec<(String, String)>) {
    for (key, value) in object {
        let column = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}{KEY_SEPARATOR}{key}")
        };

        match value {
            Value::Object(nested) => flatten_into(nested, &column, columns),
            Value::Array(items) if items.iter().all(is_scalar) => {
                let joined = items.iter().map(scalar_text).collect::<Vec<_>>();
                columns.push((column, joined.join(LIST_SEPARATOR)));
            }
            Value::Array(_) => columns.push((column, value.to_string())),
            scalar => columns.push((column, scalar_text(scalar))),
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

/// Text of a JSON scalar as it should land in a CSV cell.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}
