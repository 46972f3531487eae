//! Schema-less flattening of the completed-lessons feed.

use serde_json::{Map, Value};

/// Internal versioning field the upstream API attaches to every document.
pub const VERSION_FIELD: &str = "__v";

/// Column names (union of keys in first-seen order) plus one rendered row
/// per record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlatTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Flatten JSON objects into a table. The version field is dropped; a key
/// absent from a record renders as an empty cell.
pub fn flatten_records(records: &[Map<String, Value>]) -> FlatTable {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if key != VERSION_FIELD && !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|h| record.get(h).map(render).unwrap_or_default())
                .collect()
        })
        .collect();

    FlatTable { headers, rows }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_union_of_keys_in_first_seen_order() {
        let table = flatten_records(&records(json!([
            {"userID": "u1", "lessonID": "l1", "__v": 0},
            {"userID": "u2", "score": 9.5}
        ])));
        assert_eq!(table.headers, ["userID", "lessonID", "score"]);
        assert_eq!(table.rows[0], ["u1", "l1", ""]);
        assert_eq!(table.rows[1], ["u2", "", "9.5"]);
    }

    #[test]
    fn test_render_values() {
        let table = flatten_records(&records(json!([
            {"done": true, "none": null, "tags": ["a", "b"]}
        ])));
        assert_eq!(table.rows[0], ["true", "", "[\"a\",\"b\"]"]);
    }

    #[test]
    fn test_empty_feed() {
        assert_eq!(flatten_records(&[]), FlatTable::default());
    }
}
