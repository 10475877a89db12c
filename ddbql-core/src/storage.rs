//! Boundary to the remote storage service.
//!
//! The engine only depends on the call/return shapes below. A concrete client
//! (see the `ddbql-dynamodb` crate) owns the wire protocol.

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::types::Item;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Page size used when scanning a table for TRUNCATE.
pub const SCAN_PAGE_SIZE: i32 = 25;

/// Scalar attribute type of a key attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeType {
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "S")]
    String,
    #[serde(rename = "B")]
    Binary,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::Number => "N",
            AttributeType::String => "S",
            AttributeType::Binary => "B",
        }
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "N" => Ok(AttributeType::Number),
            "S" => Ok(AttributeType::String),
            "B" => Ok(AttributeType::Binary),
            _ => Err(format!("illegal attribute type '{}'", s)),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of an attribute in a key schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyRole {
    Hash,
    Range,
}

impl KeyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Hash => "HASH",
            KeyRole::Range => "RANGE",
        }
    }
}

impl FromStr for KeyRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HASH" => Ok(KeyRole::Hash),
            "RANGE" => Ok(KeyRole::Range),
            _ => Err(format!("illegal key type '{}'", s)),
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary index scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexScope {
    Local,
    Global,
}

impl FromStr for IndexScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOCAL" => Ok(IndexScope::Local),
            "GLOBAL" => Ok(IndexScope::Global),
            _ => Err(format!("illegal index type '{}'", s)),
        }
    }
}

/// Attribute declared in a CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub attribute_type: AttributeType,
    pub key_role: Option<KeyRole>,
}

/// Secondary index declared in a CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryIndex {
    pub name: String,
    pub scope: IndexScope,
    pub attributes: Vec<AttributeDefinition>,
}

impl SecondaryIndex {
    /// Key schema of the index, in declaration order.
    pub fn key_schema(&self) -> Vec<KeySchemaElement> {
        key_schema_of(&self.attributes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTableRequest {
    pub table_name: String,
    pub attributes: Vec<AttributeDefinition>,
    pub indexes: Vec<SecondaryIndex>,
}

impl CreateTableRequest {
    /// Key schema of the base table, in declaration order.
    pub fn key_schema(&self) -> Vec<KeySchemaElement> {
        key_schema_of(&self.attributes)
    }

    /// Every attribute that has to be declared to the service: table
    /// attributes first, then index attributes not already listed.
    pub fn all_attributes(&self) -> Vec<AttributeDefinition> {
        let mut all: Vec<AttributeDefinition> = self.attributes.clone();
        for index in &self.indexes {
            for attr in &index.attributes {
                if !all.iter().any(|a| a.name == attr.name) {
                    all.push(attr.clone());
                }
            }
        }
        all
    }
}

fn key_schema_of(attributes: &[AttributeDefinition]) -> Vec<KeySchemaElement> {
    attributes
        .iter()
        .filter_map(|attr| {
            attr.key_role.map(|role| KeySchemaElement {
                attribute_name: attr.name.clone(),
                role,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub role: KeyRole,
}

/// Table metadata returned by describe/create/delete
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableDescription {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_arn: Option<String>,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<String>,
}

/// Result of executing one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteOutput {
    pub items: Vec<Item>,
    pub next_token: Option<String>,
    pub last_evaluated_key: Option<Item>,
}

/// One page of table names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePage {
    pub names: Vec<String>,
    pub next_cursor: Option<String>,
}

/// One page of a table scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

/// Operations the shell needs from the storage service.
pub trait StorageAccess {
    /// Execute a complemented statement.
    fn execute(
        &self,
        statement: &str,
        limit: Option<i32>,
        next_token: Option<&str>,
    ) -> Result<ExecuteOutput>;

    /// Describe a table, failing with [`Error::TableNotFound`] when it does not exist.
    fn describe(&self, table_name: &str) -> Result<TableDescription>;

    fn create_table(&self, request: &CreateTableRequest) -> Result<TableDescription>;

    /// Delete a table. With `ignore_not_found` a missing table yields `Ok(None)`.
    fn delete_table(
        &self,
        table_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<TableDescription>>;

    fn list_tables(&self, start_after: Option<&str>) -> Result<TablePage>;

    /// Scan the first [`SCAN_PAGE_SIZE`] items of a table.
    fn scan_table(&self, table_name: &str) -> Result<ScanPage>;

    fn delete_item(&self, table_name: &str, key: &Item) -> Result<()>;
}

/// Builds a storage client for a connection configuration.
pub trait Connector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn StorageAccess>>;
}

impl<F> Connector for F
where
    F: Fn(&ConnectionConfig) -> Result<Box<dyn StorageAccess>>,
{
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn StorageAccess>> {
        self(config)
    }
}

/// Pull the key attributes of `item` according to `key_schema`.
pub fn extract_key(
    table_name: &str,
    key_schema: &[KeySchemaElement],
    item: &Item,
) -> Result<Item> {
    let mut key = Item::new();
    for element in key_schema {
        let value = item.get(&element.attribute_name).ok_or_else(|| {
            Error::storage(
                "truncate table",
                format!(
                    "item in table [{}] has no key attribute [{}]",
                    table_name, element.attribute_name
                ),
            )
        })?;
        key.insert(element.attribute_name.clone(), value.clone());
    }
    Ok(key)
}
