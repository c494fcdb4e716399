//! DDL translator: maps `CREATE TABLE` / `DROP TABLE` to store-side table
//! provisioning and waits for the table to reach a usable state.

use std::time::Duration;

use aws_sdk_dynamodb::types::{AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, TableStatus};
use aws_sdk_dynamodb::Client;
use dynasql_common::{Error, Result};
use tracing::{debug, instrument};

use crate::codec::TypeTag;
use crate::statement::{KeyRole, ParsedStatement};

const WAIT_BUDGET: Duration = Duration::from_secs(120);
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// DDL statements never report a meaningful row count.
pub struct DdlOutcome {
    pub rows_affected: u64,
}

#[instrument(skip(client, statement), fields(table = %statement.table))]
pub async fn create_table(client: &Client, statement: &ParsedStatement) -> Result<DdlOutcome> {
    if statement.if_not_exists && describe(client, &statement.table).await?.is_some() {
        debug!("table already exists, IF NOT EXISTS no-op");
        return Ok(DdlOutcome { rows_affected: 0 });
    }

    let mut attribute_definitions = Vec::new();
    let mut key_schema = Vec::new();
    for column in &statement.column_defs {
        let Some(role) = column.key_role else { continue };
        let scalar_type = match sql_type_to_tag(&column.sql_type)? {
            TypeTag::N => aws_sdk_dynamodb::types::ScalarAttributeType::N,
            TypeTag::S => aws_sdk_dynamodb::types::ScalarAttributeType::S,
            TypeTag::B => aws_sdk_dynamodb::types::ScalarAttributeType::B,
            TypeTag::Bool => {
                return Err(Error::Unsupported(format!("{} cannot be a key attribute (BOOL has no key type)", column.name)))
            }
        };
        attribute_definitions.push(
            AttributeDefinition::builder()
                .attribute_name(&column.name)
                .attribute_type(scalar_type)
                .build()
                .map_err(|e| Error::Config(e.to_string()))?,
        );
        key_schema.push(
            KeySchemaElement::builder()
                .attribute_name(&column.name)
                .key_type(key_type(role))
                .build()
                .map_err(|e| Error::Config(e.to_string()))?,
        );
    }
    if key_schema.is_empty() {
        return Err(Error::Config(format!("CREATE TABLE {:?} declares no key columns", statement.table)));
    }

    client
        .create_table()
        .table_name(&statement.table)
        .set_attribute_definitions(Some(attribute_definitions))
        .set_key_schema(Some(key_schema))
        .provisioned_throughput(
            ProvisionedThroughput::builder()
                .read_capacity_units(1)
                .write_capacity_units(1)
                .build()
                .map_err(|e| Error::Config(e.to_string()))?,
        )
        .send()
        .await
        .map_err(|e| Error::store("CreateTable", &statement.table, e))?;

    wait_for(client, &statement.table, |status| status != Some(TableStatus::Creating)).await?;
    Ok(DdlOutcome { rows_affected: 0 })
}

#[instrument(skip(client, statement), fields(table = %statement.table))]
pub async fn drop_table(client: &Client, statement: &ParsedStatement) -> Result<DdlOutcome> {
    if statement.if_exists && describe(client, &statement.table).await?.is_none() {
        debug!("table already absent, IF EXISTS no-op");
        return Ok(DdlOutcome { rows_affected: 0 });
    }

    client
        .delete_table()
        .table_name(&statement.table)
        .send()
        .await
        .map_err(|e| Error::store("DeleteTable", &statement.table, e))?;

    wait_for(client, &statement.table, |status| status.is_none()).await?;
    Ok(DdlOutcome { rows_affected: 0 })
}

/// `None` means the table doesn't exist; the wait loops treat a
/// `ResourceNotFoundException` on describe-after-delete as "gone", not a
/// transient failure.
async fn describe(client: &Client, table: &str) -> Result<Option<TableStatus>> {
    match client.describe_table().table_name(table).send().await {
        Ok(output) => Ok(output.table().and_then(|t| t.table_status().cloned())),
        Err(err) => {
            let not_found = err.as_service_error().map(|e| e.is_resource_not_found_exception()).unwrap_or(false);
            if not_found {
                Ok(None)
            } else {
                Err(Error::store("DescribeTable", table, err))
            }
        }
    }
}

async fn wait_for(client: &Client, table: &str, mut done: impl FnMut(Option<TableStatus>) -> bool) -> Result<()> {
    let deadline = tokio::time::Instant::now() + WAIT_BUDGET;
    loop {
        let status = describe(client, table).await?;
        if done(status) {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::Timeout { table: table.to_string() });
        }
        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    }
}

fn key_type(role: KeyRole) -> KeyType {
    match role {
        KeyRole::Hash => KeyType::Hash,
        KeyRole::Range => KeyType::Range,
    }
}

fn sql_type_to_tag(sql_type: &str) -> Result<TypeTag> {
    match sql_type.to_ascii_lowercase().as_str() {
        "int" | "integer" | "numeric" | "decimal" | "float" | "double" => Ok(TypeTag::N),
        "bool" | "boolean" => Ok(TypeTag::Bool),
        "varchar" | "text" | "string" | "char" => Ok(TypeTag::S),
        other => Err(Error::Unsupported(format!("unsupported column type: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{ColumnDef, StatementKind};

    #[test]
    fn sql_type_mapping_matches_table() {
        assert_eq!(sql_type_to_tag("int").unwrap(), TypeTag::N);
        assert_eq!(sql_type_to_tag("DECIMAL").unwrap(), TypeTag::N);
        assert_eq!(sql_type_to_tag("bool").unwrap(), TypeTag::Bool);
        assert_eq!(sql_type_to_tag("varchar").unwrap(), TypeTag::S);
        assert!(sql_type_to_tag("blob").is_err());
    }

    #[test]
    fn create_table_without_key_columns_is_rejected() {
        let statement = ParsedStatement {
            kind: StatementKind::Create,
            table: "music".into(),
            column_defs: vec![ColumnDef { name: "Genre".into(), sql_type: "string".into(), key_role: None }],
            ..ParsedStatement::empty()
        };
        assert!(statement.column_defs.iter().all(|c| c.key_role.is_none()));
    }
}
