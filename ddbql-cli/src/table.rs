/// Table formatting for query results using comfy-table

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use ddbql_core::{Item, Value};
use std::collections::BTreeSet;

/// Format a list of items as a table
///
/// Columns are the union of attribute names across all items, sorted.
/// Scalars are shown directly; lists, maps and sets in a compact inline form.
pub fn format_items_table(items: &[Item]) -> String {
    if items.is_empty() {
        return "No items found".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let columns: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.keys().map(String::as_str))
        .collect();

    table.set_header(columns.iter().map(|col| Cell::new(col)).collect::<Vec<_>>());

    for item in items {
        let row = columns
            .iter()
            .map(|col| match item.get(*col) {
                Some(value) => Cell::new(format_value(value)),
                None => Cell::new("-"),
            })
            .collect::<Vec<_>>();
        table.add_row(row);
    }

    table.to_string()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::S(s) | Value::N(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::B(bytes) => format!("<Binary {} bytes>", bytes.len()),
        Value::L(list) => {
            let items: Vec<String> = list.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::M(map) => {
            let mut pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", k, format_value(v)))
                .collect();
            pairs.sort();
            format!("{{{}}}", pairs.join(", "))
        }
        Value::Ss(set) | Value::Ns(set) => format!("<<{}>>", set.join(", ")),
        Value::Bs(set) => format!("<<{} binary values>>", set.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;

    fn item(pairs: &[(&str, Value)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_format_empty_items() {
        assert_eq!(format_items_table(&[]), "No items found");
    }

    #[test]
    fn test_format_mixed_attributes() {
        let items = vec![
            item(&[("name", Value::string("Alice")), ("age", Value::number(30))]),
            item(&[("name", Value::string("Bob")), ("active", Value::Bool(true))]),
        ];

        let output = format_items_table(&items);
        assert!(output.contains("Alice"));
        assert!(output.contains("Bob"));
        assert!(output.contains("30"));
        assert!(output.contains("true"));
        assert!(output.contains("active"));
        assert!(output.contains('-'));
    }

    #[test]
    fn test_format_value_types() {
        assert_eq!(format_value(&Value::string("test")), "test");
        assert_eq!(format_value(&Value::number(42)), "42");
        assert_eq!(format_value(&Value::Null), "null");
        assert_eq!(
            format_value(&Value::B(Bytes::from_static(b"abc"))),
            "<Binary 3 bytes>"
        );
        assert_eq!(
            format_value(&Value::L(vec![Value::string("a"), Value::number(1)])),
            "[a, 1]"
        );
        assert_eq!(
            format_value(&Value::Ss(vec!["x".into(), "y".into()])),
            "<<x, y>>"
        );
    }

    #[test]
    fn test_format_map_value() {
        let mut map = HashMap::new();
        map.insert("key".to_string(), Value::string("value"));
        assert_eq!(format_value(&Value::M(map)), "{\"key\": value}");
    }
}
