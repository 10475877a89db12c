use base64::Engine;
use bytes::Bytes;
use std::collections::HashMap;

/// Attribute value as returned by the service
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String
    S(String),
    /// Number (stored as string for precision)
    N(String),
    /// Binary
    B(Bytes),
    /// Boolean
    Bool(bool),
    /// Null
    Null,
    /// List
    L(Vec<Value>),
    /// Map
    M(HashMap<String, Value>),
    /// String set
    Ss(Vec<String>),
    /// Number set
    Ns(Vec<String>),
    /// Binary set
    Bs(Vec<Bytes>),
}

/// A single record: attribute name to value
pub type Item = HashMap<String, Value>;

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::S(s.into())
    }

    pub fn number(n: impl ToString) -> Self {
        Value::N(n.to_string())
    }

    pub fn binary(b: impl Into<Bytes>) -> Self {
        Value::B(b.into())
    }
}

/// Render an item as a JSON object for display.
pub fn item_to_json(item: &Item) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (key, value) in item {
        obj.insert(key.clone(), value_to_json(value));
    }
    serde_json::Value::Object(obj)
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::S(s) => serde_json::Value::String(s.clone()),
        Value::N(n) => number_to_json(n),
        Value::B(bytes) => serde_json::Value::String(encode_binary(bytes)),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Null => serde_json::Value::Null,
        Value::L(list) => serde_json::Value::Array(list.iter().map(value_to_json).collect()),
        Value::M(map) => item_to_json(map),
        Value::Ss(set) => serde_json::Value::Array(
            set.iter().cloned().map(serde_json::Value::String).collect(),
        ),
        Value::Ns(set) => serde_json::Value::Array(set.iter().map(|n| number_to_json(n)).collect()),
        Value::Bs(set) => serde_json::Value::Array(
            set.iter()
                .map(|b| serde_json::Value::String(encode_binary(b)))
                .collect(),
        ),
    }
}

fn number_to_json(n: &str) -> serde_json::Value {
    if let Ok(i) = n.parse::<i64>() {
        serde_json::Value::Number(i.into())
    } else if let Ok(f) = n.parse::<f64>() {
        serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(n.to_string()))
    } else {
        serde_json::Value::String(n.to_string())
    }
}

fn encode_binary(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_to_json() {
        let mut nested = HashMap::new();
        nested.insert("flag".to_string(), Value::Bool(true));

        let mut item = Item::new();
        item.insert("pk".to_string(), Value::string("user#1"));
        item.insert("age".to_string(), Value::number(42));
        item.insert("score".to_string(), Value::number("1.5"));
        item.insert("raw".to_string(), Value::binary(vec![1u8, 2, 3]));
        item.insert("tags".to_string(), Value::Ss(vec!["a".into(), "b".into()]));
        item.insert("meta".to_string(), Value::M(nested));
        item.insert("gone".to_string(), Value::Null);

        assert_eq!(
            item_to_json(&item),
            json!({
                "pk": "user#1",
                "age": 42,
                "score": 1.5,
                "raw": "AQID",
                "tags": ["a", "b"],
                "meta": {"flag": true},
                "gone": null
            })
        );
    }

    #[test]
    fn test_unparseable_number_kept_as_string() {
        assert_eq!(value_to_json(&Value::N("1e999".into())), json!("1e999"));
    }
}
