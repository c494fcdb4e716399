//! Schema probe: discovers a table's key attributes and a best-effort
//! column list by describing the table and sampling one row.

use std::collections::HashSet;

use aws_sdk_dynamodb::types::{KeyType, ScalarAttributeType};
use aws_sdk_dynamodb::Client;
use dynasql_common::{Error, Result};
use tracing::instrument;

use crate::codec::{self, TypeTag};
use crate::statement::KeyRole;

/// One key attribute and the role it plays in the table's key schema.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAttribute {
    pub name: String,
    pub role: KeyRole,
}

/// A table's key schema: 1 or 2 elements, HASH first then RANGE.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub keys: Vec<KeyAttribute>,
}

impl TableSchema {
    #[must_use]
    pub fn key_names(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.name.clone()).collect()
    }

    #[must_use]
    pub fn name_set(&self) -> HashSet<&str> {
        self.keys.iter().map(|k| k.name.as_str()).collect()
    }
}

/// Fetches the ordered key schema for `table` via `DescribeTable`.
#[instrument(skip(client))]
pub async fn key_names(client: &Client, table: &str) -> Result<TableSchema> {
    let output = client
        .describe_table()
        .table_name(table)
        .send()
        .await
        .map_err(|e| Error::store("DescribeTable", table, e))?;
    let table_desc =
        output.table().ok_or_else(|| Error::Config(format!("no table description returned for {table:?}")))?;

    let mut keys: Vec<KeyAttribute> = table_desc
        .key_schema()
        .iter()
        .filter_map(|elem| {
            let role = match elem.key_type() {
                KeyType::Hash => KeyRole::Hash,
                KeyType::Range => KeyRole::Range,
                _ => return None,
            };
            Some(KeyAttribute { name: elem.attribute_name().to_string(), role })
        })
        .collect();
    keys.sort_by_key(|k| if k.role == KeyRole::Hash { 0 } else { 1 });

    Ok(TableSchema { keys })
}

/// Returns the key attributes plus any attributes observed in a one-row
/// sample scan. Best-effort: callers must not rely on completeness beyond
/// the key attributes.
#[instrument(skip(client))]
pub async fn columns(client: &Client, table: &str) -> Result<Vec<(String, TypeTag)>> {
    let output = client
        .describe_table()
        .table_name(table)
        .send()
        .await
        .map_err(|e| Error::store("DescribeTable", table, e))?;
    let table_desc =
        output.table().ok_or_else(|| Error::Config(format!("no table description returned for {table:?}")))?;

    let mut seen = HashSet::new();
    let mut cols = Vec::new();
    for attr in table_desc.attribute_definitions() {
        let tag = match attr.attribute_type() {
            ScalarAttributeType::N => TypeTag::N,
            ScalarAttributeType::B => TypeTag::B,
            _ => TypeTag::S,
        };
        if seen.insert(attr.attribute_name().to_string()) {
            cols.push((attr.attribute_name().to_string(), tag));
        }
    }

    let sample = client.scan().table_name(table).limit(1).send().await.map_err(|e| Error::store("Scan", table, e))?;
    if let Some(item) = sample.items().first() {
        for (name, value) in item {
            if seen.insert(name.clone()) {
                cols.push((name.clone(), codec::type_tag(value)));
            }
        }
    }

    Ok(cols)
}
