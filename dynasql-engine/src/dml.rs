//! DML executor: dispatches `INSERT` (put), `UPDATE` (conditional on key
//! equality), and `DELETE` (point or scan-and-delete fallback).

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use dynasql_common::{Error, Result};
use tracing::{debug, instrument};

use crate::codec;
use crate::criteria::{self, CriteriaMap, CriteriaValue, ParamStream};
use crate::schema;
use crate::statement::{ComparisonOp, ParsedStatement, ValueExpr};
use crate::value::{Record, RecordValue};

pub struct DmlOutcome {
    pub rows_affected: u64,
}

fn record_from_assignments(statement: &ParsedStatement, params: &mut ParamStream) -> Result<Record> {
    let mut record = Record::new();
    for assignment in &statement.assignments {
        let value = match &assignment.value {
            ValueExpr::Placeholder => params.next(&assignment.column)?,
            ValueExpr::Literal(lit) => criteria::parse_literal(lit),
        };
        record.insert(assignment.column.clone(), value);
    }
    Ok(record)
}

fn flatten_scalars(map: &CriteriaMap) -> Result<Record> {
    map.iter()
        .map(|(column, value)| match value {
            CriteriaValue::Scalar(v) => Ok((column.clone(), v.clone())),
            CriteriaValue::Seq(_) => {
                Err(Error::Unsupported(format!("key predicate does not support IN on column {column:?} here")))
            }
        })
        .collect()
}

#[instrument(skip(client, statement, params), fields(table = %statement.table))]
pub async fn insert(client: &Client, statement: &ParsedStatement, params: &mut ParamStream<'_>) -> Result<DmlOutcome> {
    let record = record_from_assignments(statement, params)?;
    let item = codec::encode(&record)?;
    client
        .put_item()
        .table_name(&statement.table)
        .set_item(Some(item))
        .send()
        .await
        .map_err(|e| Error::store("PutItem", &statement.table, e))?;
    Ok(DmlOutcome { rows_affected: 1 })
}

#[instrument(skip(client, statement, params), fields(table = %statement.table))]
pub async fn update(client: &Client, statement: &ParsedStatement, params: &mut ParamStream<'_>) -> Result<DmlOutcome> {
    let set_record = record_from_assignments(statement, params)?;
    if set_record.is_empty() {
        debug!("UPDATE with empty SET clause, no-op");
        return Ok(DmlOutcome { rows_affected: 0 });
    }
    if statement.criteria.is_empty() {
        return Err(Error::EmptyCriteria);
    }
    if statement.criteria[0].op != ComparisonOp::Eq {
        return Err(Error::Unsupported("UPDATE WHERE must start with an equality predicate".into()));
    }

    let key_map = criteria::extract_key_criteria(&statement.criteria, params)?;
    let key_record = flatten_scalars(&key_map)?;
    let key = codec::encode(&key_record)?;

    let mut update_parts = Vec::with_capacity(set_record.len());
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();
    for (i, (column, value)) in set_record.iter().enumerate() {
        let name_placeholder = format!("#s{i}");
        let value_placeholder = format!(":s{i}");
        expr_names.insert(name_placeholder.clone(), column.clone());
        expr_values.insert(value_placeholder.clone(), codec::encode_value(value)?);
        update_parts.push(format!("{name_placeholder} = {value_placeholder}"));
    }

    client
        .update_item()
        .table_name(&statement.table)
        .set_key(Some(key))
        .update_expression(format!("SET {}", update_parts.join(", ")))
        .set_expression_attribute_names(Some(expr_names))
        .set_expression_attribute_values(Some(expr_values))
        .send()
        .await
        .map_err(|e| Error::store("UpdateItem", &statement.table, e))?;

    // DynamoDB's UpdateItem upserts by default; the engine does not verify
    // prior existence, so this is reported regardless of whether the key
    // previously existed.
    Ok(DmlOutcome { rows_affected: 1 })
}

#[instrument(skip(client, statement, params), fields(table = %statement.table))]
pub async fn delete(client: &Client, statement: &ParsedStatement, params: &mut ParamStream<'_>) -> Result<DmlOutcome> {
    if let Some(first) = statement.criteria.first() {
        if !matches!(first.op, ComparisonOp::Eq | ComparisonOp::In) {
            return Err(Error::Unsupported("DELETE WHERE must start with an equality or IN predicate".into()));
        }
    }

    let key_map = criteria::extract_key_criteria(&statement.criteria, params)?;
    if key_map.is_empty() {
        return scan_and_delete(client, &statement.table).await;
    }

    let mut rows_affected = 0u64;
    for tuple in criteria::expand_key_tuples(&key_map)? {
        let record: Record = tuple.into_iter().collect();
        let key = codec::encode(&record)?;
        client
            .delete_item()
            .table_name(&statement.table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| Error::store("DeleteItem", &statement.table, e))?;
        rows_affected += 1;
    }
    Ok(DmlOutcome { rows_affected })
}

/// The `DELETE FROM t` (no `WHERE`) fallback: scans the whole table and
/// deletes every item by its projected key. Documented as testing-only —
/// O(N) store operations, unbounded cost.
async fn scan_and_delete(client: &Client, table: &str) -> Result<DmlOutcome> {
    let schema = schema::key_names(client, table).await?;
    let key_names = schema.key_names();
    let mut rows_affected = 0u64;
    let mut cursor = None;
    loop {
        let mut request = client.scan().table_name(table);
        if let Some(start) = cursor.take() {
            request = request.set_exclusive_start_key(Some(start));
        }
        let output = request.send().await.map_err(|e| Error::store("Scan", table, e))?;

        for item in output.items() {
            let key: HashMap<String, AttributeValue> =
                key_names.iter().filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone()))).collect();
            client
                .delete_item()
                .table_name(table)
                .set_key(Some(key))
                .send()
                .await
                .map_err(|e| Error::store("DeleteItem", table, e))?;
            rows_affected += 1;
        }

        match output.last_evaluated_key() {
            Some(next) if !next.is_empty() => cursor = Some(next.clone()),
            _ => break,
        }
    }
    Ok(DmlOutcome { rows_affected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{Assignment, StatementKind};

    #[test]
    fn record_from_assignments_resolves_placeholders_and_literals() {
        let statement = ParsedStatement {
            kind: StatementKind::Insert,
            table: "music".into(),
            assignments: vec![
                Assignment { column: "Artist".into(), value: ValueExpr::Placeholder },
                Assignment { column: "ReleaseYear".into(), value: ValueExpr::Literal("2000".into()) },
            ],
            ..ParsedStatement::empty()
        };
        let params_vec = vec![RecordValue::String("A0".into())];
        let mut params = ParamStream::new(&params_vec);
        let record = record_from_assignments(&statement, &mut params).unwrap();
        assert_eq!(record.get("Artist"), Some(&RecordValue::String("A0".into())));
        assert_eq!(record.get("ReleaseYear"), Some(&RecordValue::Integer(2000)));
    }

    #[test]
    fn flatten_scalars_rejects_seq_values() {
        let mut map = CriteriaMap::new();
        map.insert(
            "Artist".into(),
            CriteriaValue::Seq(vec![RecordValue::String("A0".into()), RecordValue::String("A1".into())]),
        );
        let err = flatten_scalars(&map).unwrap_err();
        assert_eq!(err.kind(), dynasql_common::ErrorKind::Unsupported);
    }
}
