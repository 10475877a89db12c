/// Conversion between service attribute values and shell values
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{
    AttributeValue, KeyType, ScalarAttributeType, TableDescription as AwsTableDescription,
};
use bytes::Bytes;
use ddbql_core::storage::{AttributeType, KeyRole, KeySchemaElement, TableDescription};
use ddbql_core::{Item, Value};
use std::collections::HashMap;
use tracing::warn;

pub type AwsItem = HashMap<String, AttributeValue>;

pub fn value_from_aws(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::S(s.clone()),
        AttributeValue::N(n) => Value::N(n.clone()),
        AttributeValue::B(b) => Value::B(Bytes::copy_from_slice(b.as_ref())),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(list) => Value::L(list.iter().map(value_from_aws).collect()),
        AttributeValue::M(map) => Value::M(item_from_aws(map)),
        AttributeValue::Ss(set) => Value::Ss(set.clone()),
        AttributeValue::Ns(set) => Value::Ns(set.clone()),
        AttributeValue::Bs(set) => Value::Bs(
            set.iter()
                .map(|b| Bytes::copy_from_slice(b.as_ref()))
                .collect(),
        ),
        other => {
            warn!(?other, "unsupported attribute value, showing as null");
            Value::Null
        }
    }
}

pub fn value_to_aws(value: &Value) -> AttributeValue {
    match value {
        Value::S(s) => AttributeValue::S(s.clone()),
        Value::N(n) => AttributeValue::N(n.clone()),
        Value::B(b) => AttributeValue::B(Blob::new(b.to_vec())),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Null => AttributeValue::Null(true),
        Value::L(list) => AttributeValue::L(list.iter().map(value_to_aws).collect()),
        Value::M(map) => AttributeValue::M(item_to_aws(map)),
        Value::Ss(set) => AttributeValue::Ss(set.clone()),
        Value::Ns(set) => AttributeValue::Ns(set.clone()),
        Value::Bs(set) => AttributeValue::Bs(set.iter().map(|b| Blob::new(b.to_vec())).collect()),
    }
}

pub fn item_from_aws(item: &AwsItem) -> Item {
    item.iter()
        .map(|(name, value)| (name.clone(), value_from_aws(value)))
        .collect()
}

pub fn item_to_aws(item: &Item) -> AwsItem {
    item.iter()
        .map(|(name, value)| (name.clone(), value_to_aws(value)))
        .collect()
}

pub fn scalar_type(attribute_type: AttributeType) -> ScalarAttributeType {
    match attribute_type {
        AttributeType::Number => ScalarAttributeType::N,
        AttributeType::String => ScalarAttributeType::S,
        AttributeType::Binary => ScalarAttributeType::B,
    }
}

pub fn key_type(role: KeyRole) -> KeyType {
    match role {
        KeyRole::Hash => KeyType::Hash,
        KeyRole::Range => KeyType::Range,
    }
}

pub fn description_from_aws(table: &AwsTableDescription) -> TableDescription {
    let key_schema = table
        .key_schema()
        .iter()
        .map(|element| KeySchemaElement {
            attribute_name: element.attribute_name().to_string(),
            role: match element.key_type() {
                KeyType::Range => KeyRole::Range,
                _ => KeyRole::Hash,
            },
        })
        .collect();

    let attribute_definitions = table
        .attribute_definitions()
        .iter()
        .map(|definition| {
            (
                definition.attribute_name().to_string(),
                definition.attribute_type().as_str().to_string(),
            )
        })
        .collect();

    TableDescription {
        table_name: table.table_name().unwrap_or_default().to_string(),
        table_status: table.table_status().map(|s| s.as_str().to_string()),
        table_arn: table.table_arn().map(str::to_string),
        key_schema,
        attribute_definitions,
        item_count: table.item_count(),
        local_secondary_indexes: table
            .local_secondary_indexes()
            .iter()
            .filter_map(|index| index.index_name().map(str::to_string))
            .collect(),
        global_secondary_indexes: table
            .global_secondary_indexes()
            .iter()
            .filter_map(|index| index.index_name().map(str::to_string))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::{AttributeDefinition, KeySchemaElement as AwsKeySchemaElement};

    #[test]
    fn test_nested_value_conversion() {
        let mut inner = HashMap::new();
        inner.insert("n".to_string(), Value::N("1.5".to_string()));
        let mut item = Item::new();
        item.insert("id".to_string(), Value::S("u1".to_string()));
        item.insert("blob".to_string(), Value::B(Bytes::from_static(b"\x00\x01")));
        item.insert("meta".to_string(), Value::M(inner));
        item.insert("tags".to_string(), Value::Ss(vec!["a".into(), "b".into()]));
        item.insert("gone".to_string(), Value::Null);

        let aws = item_to_aws(&item);
        assert_eq!(aws.get("gone"), Some(&AttributeValue::Null(true)));
        assert_eq!(item_from_aws(&aws), item);
    }

    #[test]
    fn test_description_conversion() {
        let table = AwsTableDescription::builder()
            .table_name("users")
            .table_status(aws_sdk_dynamodb::types::TableStatus::Active)
            .key_schema(
                AwsKeySchemaElement::builder()
                    .attribute_name("id")
                    .key_type(KeyType::Hash)
                    .build()
                    .unwrap(),
            )
            .key_schema(
                AwsKeySchemaElement::builder()
                    .attribute_name("ts")
                    .key_type(KeyType::Range)
                    .build()
                    .unwrap(),
            )
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name("id")
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .unwrap(),
            )
            .item_count(3)
            .build();

        let description = description_from_aws(&table);
        assert_eq!(description.table_name, "users");
        assert_eq!(description.table_status.as_deref(), Some("ACTIVE"));
        assert_eq!(description.key_schema.len(), 2);
        assert_eq!(description.key_schema[1].role, KeyRole::Range);
        assert_eq!(
            description.attribute_definitions,
            vec![("id".to_string(), "S".to_string())]
        );
        assert_eq!(description.item_count, Some(3));
    }
}
