//! Amazon DynamoDB implementation of the shell's storage access.
//!
//! The SDK is asynchronous; [`DynamoStorage`] owns a tokio runtime and blocks
//! on each request so the shell engine stays synchronous.

mod convert;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement,
    LocalSecondaryIndex, Projection, ProjectionType,
};
use aws_sdk_dynamodb::Client;
use ddbql_core::storage::{
    CreateTableRequest, ExecuteOutput, IndexScope, ScanPage, StorageAccess, TableDescription,
    TablePage, SCAN_PAGE_SIZE,
};
use ddbql_core::{ConnectionConfig, Error, Item, Result};
use std::fmt::Debug;
use tokio::runtime::Runtime;
use tracing::debug;

pub use convert::{item_from_aws, item_to_aws, value_from_aws, value_to_aws};

const CREDENTIALS_PROVIDER_NAME: &str = "ddbql";

/// DynamoDB client bound to one connection configuration
pub struct DynamoStorage {
    runtime: Runtime,
    client: Client,
}

impl DynamoStorage {
    /// Build a client from the default provider chain, overridden by `config`.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let runtime = Runtime::new()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(credentials) = config.credentials() {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id,
                credentials.secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        let sdk_config = runtime.block_on(loader.load());
        debug!(
            region = ?sdk_config.region(),
            endpoint = ?config.endpoint,
            "dynamodb client configured"
        );

        Ok(Self {
            runtime,
            client: Client::new(&sdk_config),
        })
    }
}

/// Map an SDK failure, routing "resource not found" to [`Error::TableNotFound`].
fn sdk_error<E, R>(operation: &'static str, table_name: &str, err: SdkError<E, R>) -> Error
where
    E: std::error::Error + ResourceNotFound + 'static,
    R: Debug,
{
    if err
        .as_service_error()
        .map(ResourceNotFound::is_resource_not_found)
        .unwrap_or(false)
    {
        return Error::TableNotFound(table_name.to_string());
    }
    Error::storage(operation, DisplayErrorContext(&err))
}

trait ResourceNotFound {
    fn is_resource_not_found(&self) -> bool;
}

macro_rules! resource_not_found {
    ($($error:ty),* $(,)?) => {
        $(
            impl ResourceNotFound for $error {
                fn is_resource_not_found(&self) -> bool {
                    self.is_resource_not_found_exception()
                }
            }
        )*
    };
}

resource_not_found!(
    aws_sdk_dynamodb::operation::describe_table::DescribeTableError,
    aws_sdk_dynamodb::operation::delete_table::DeleteTableError,
    aws_sdk_dynamodb::operation::scan::ScanError,
    aws_sdk_dynamodb::operation::delete_item::DeleteItemError,
);

macro_rules! never_resource_not_found {
    ($($error:ty),* $(,)?) => {
        $(
            impl ResourceNotFound for $error {
                fn is_resource_not_found(&self) -> bool {
                    false
                }
            }
        )*
    };
}

// a statement can name any table, so its failures are reported verbatim
never_resource_not_found!(
    aws_sdk_dynamodb::operation::execute_statement::ExecuteStatementError,
    aws_sdk_dynamodb::operation::create_table::CreateTableError,
    aws_sdk_dynamodb::operation::list_tables::ListTablesError,
);

fn key_schema(
    elements: &[ddbql_core::storage::KeySchemaElement],
) -> Result<Vec<KeySchemaElement>> {
    elements
        .iter()
        .map(|element| {
            KeySchemaElement::builder()
                .attribute_name(&element.attribute_name)
                .key_type(convert::key_type(element.role))
                .build()
                .map_err(|e| Error::storage("create table", e))
        })
        .collect()
}

fn build_create_request(
    request: &CreateTableRequest,
) -> Result<(
    Vec<AttributeDefinition>,
    Vec<KeySchemaElement>,
    Vec<LocalSecondaryIndex>,
    Vec<GlobalSecondaryIndex>,
)> {
    let attributes = request
        .all_attributes()
        .iter()
        .map(|attribute| {
            AttributeDefinition::builder()
                .attribute_name(&attribute.name)
                .attribute_type(convert::scalar_type(attribute.attribute_type))
                .build()
                .map_err(|e| Error::storage("create table", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let table_keys = key_schema(&request.key_schema())?;

    let mut local = Vec::new();
    let mut global = Vec::new();
    for index in &request.indexes {
        let projection = Projection::builder()
            .projection_type(ProjectionType::All)
            .build();
        let keys = key_schema(&index.key_schema())?;
        match index.scope {
            IndexScope::Local => local.push(
                LocalSecondaryIndex::builder()
                    .index_name(&index.name)
                    .set_key_schema(Some(keys))
                    .projection(projection)
                    .build()
                    .map_err(|e| Error::storage("create table", e))?,
            ),
            IndexScope::Global => global.push(
                GlobalSecondaryIndex::builder()
                    .index_name(&index.name)
                    .set_key_schema(Some(keys))
                    .projection(projection)
                    .build()
                    .map_err(|e| Error::storage("create table", e))?,
            ),
        }
    }

    Ok((attributes, table_keys, local, global))
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

impl StorageAccess for DynamoStorage {
    fn execute(
        &self,
        statement: &str,
        limit: Option<i32>,
        next_token: Option<&str>,
    ) -> Result<ExecuteOutput> {
        debug!(statement, ?limit, ?next_token, "execute statement");
        let output = self
            .runtime
            .block_on(
                self.client
                    .execute_statement()
                    .statement(statement)
                    .set_limit(limit)
                    .set_next_token(next_token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| sdk_error("execute statement", statement, e))?;

        Ok(ExecuteOutput {
            items: output.items().iter().map(item_from_aws).collect(),
            next_token: output.next_token().map(str::to_string),
            last_evaluated_key: output.last_evaluated_key().map(item_from_aws),
        })
    }

    fn describe(&self, table_name: &str) -> Result<TableDescription> {
        let output = self
            .runtime
            .block_on(self.client.describe_table().table_name(table_name).send())
            .map_err(|e| sdk_error("describe table", table_name, e))?;

        output
            .table()
            .map(convert::description_from_aws)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))
    }

    fn create_table(&self, request: &CreateTableRequest) -> Result<TableDescription> {
        let (attributes, keys, local, global) = build_create_request(request)?;
        debug!(
            table = %request.table_name,
            local_indexes = local.len(),
            global_indexes = global.len(),
            "create table"
        );

        let output = self
            .runtime
            .block_on(
                self.client
                    .create_table()
                    .table_name(&request.table_name)
                    .set_attribute_definitions(Some(attributes))
                    .set_key_schema(Some(keys))
                    .set_local_secondary_indexes(non_empty(local))
                    .set_global_secondary_indexes(non_empty(global))
                    .billing_mode(BillingMode::PayPerRequest)
                    .send(),
            )
            .map_err(|e| sdk_error("create table", &request.table_name, e))?;

        Ok(output
            .table_description()
            .map(convert::description_from_aws)
            .unwrap_or_else(|| TableDescription {
                table_name: request.table_name.clone(),
                ..Default::default()
            }))
    }

    fn delete_table(
        &self,
        table_name: &str,
        ignore_not_found: bool,
    ) -> Result<Option<TableDescription>> {
        let result = self
            .runtime
            .block_on(self.client.delete_table().table_name(table_name).send())
            .map_err(|e| sdk_error("drop table", table_name, e));

        match result {
            Ok(output) => Ok(output.table_description().map(convert::description_from_aws)),
            Err(Error::TableNotFound(_)) if ignore_not_found => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list_tables(&self, start_after: Option<&str>) -> Result<TablePage> {
        let output = self
            .runtime
            .block_on(
                self.client
                    .list_tables()
                    .set_exclusive_start_table_name(start_after.map(str::to_string))
                    .send(),
            )
            .map_err(|e| sdk_error("show tables", "", e))?;

        Ok(TablePage {
            names: output.table_names().to_vec(),
            next_cursor: output.last_evaluated_table_name().map(str::to_string),
        })
    }

    fn scan_table(&self, table_name: &str) -> Result<ScanPage> {
        let output = self
            .runtime
            .block_on(
                self.client
                    .scan()
                    .table_name(table_name)
                    .limit(SCAN_PAGE_SIZE)
                    .send(),
            )
            .map_err(|e| sdk_error("scan table", table_name, e))?;

        Ok(ScanPage {
            items: output.items().iter().map(item_from_aws).collect(),
            last_evaluated_key: output.last_evaluated_key().map(item_from_aws),
        })
    }

    fn delete_item(&self, table_name: &str, key: &Item) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .delete_item()
                    .table_name(table_name)
                    .set_key(Some(item_to_aws(key)))
                    .send(),
            )
            .map_err(|e| sdk_error("delete item", table_name, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddbql_core::storage::{AttributeDefinition as Attribute, AttributeType, KeyRole, SecondaryIndex};

    fn attribute(name: &str, role: Option<KeyRole>) -> Attribute {
        Attribute {
            name: name.to_string(),
            attribute_type: AttributeType::String,
            key_role: role,
        }
    }

    #[test]
    fn test_build_create_request_with_indexes() {
        let request = CreateTableRequest {
            table_name: "orders".to_string(),
            attributes: vec![
                attribute("id", Some(KeyRole::Hash)),
                attribute("ts", Some(KeyRole::Range)),
            ],
            indexes: vec![
                SecondaryIndex {
                    name: "by_status".to_string(),
                    scope: IndexScope::Local,
                    attributes: vec![
                        attribute("id", Some(KeyRole::Hash)),
                        attribute("status", Some(KeyRole::Range)),
                    ],
                },
                SecondaryIndex {
                    name: "by_owner".to_string(),
                    scope: IndexScope::Global,
                    attributes: vec![attribute("owner", Some(KeyRole::Hash))],
                },
            ],
        };

        let (attributes, keys, local, global) = build_create_request(&request).unwrap();
        let names: Vec<&str> = attributes.iter().map(|a| a.attribute_name()).collect();
        assert_eq!(names, vec!["id", "ts", "status", "owner"]);
        assert_eq!(keys.len(), 2);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].index_name(), "by_status");
        assert_eq!(global.len(), 1);
        assert_eq!(
            global[0].projection().and_then(|p| p.projection_type()),
            Some(&ProjectionType::All)
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty::<i32>(vec![]), None);
        assert_eq!(non_empty(vec![1]), Some(vec![1]));
    }
}
