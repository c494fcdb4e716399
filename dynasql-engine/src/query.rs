//! Query executor: decides `GetItem` vs. `Scan`, builds projection and
//! filter expressions, escapes reserved identifiers, paginates, emits
//! rows through a handler, and specially handles `COUNT(*)`.

use std::collections::{HashMap, HashSet};

use aws_sdk_dynamodb::types::Select;
use aws_sdk_dynamodb::Client;
use dynasql_common::{Error, Result};
use tracing::instrument;

use crate::codec;
use crate::criteria::{self, CriteriaMap, ParamStream};
use crate::schema::{self, TableSchema};
use crate::statement::{ComparisonOp, ParsedStatement};
use crate::value::{Record, RecordValue};

/// Reserved DynamoDB identifiers this engine knows to escape in
/// projections, via an expression-attribute-name map. The store's
/// reserved-word list is much longer; this is an extension point, not a
/// complete table.
#[derive(Debug, Clone)]
pub struct ReservedWords(HashSet<String>);

impl Default for ReservedWords {
    fn default() -> Self {
        Self(["Date", "User"].into_iter().map(String::from).collect())
    }
}

impl ReservedWords {
    pub fn reserve(&mut self, word: impl Into<String>) {
        self.0.insert(word.into());
    }

    fn is_reserved(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

/// `SELECT … FROM t [WHERE …]`. Rows are emitted through `handler`, which
/// returns `Ok(false)` to stop iteration early.
#[instrument(skip(client, statement, params, reserved, handler), fields(table = %statement.table))]
pub async fn select<F>(
    client: &Client,
    statement: &ParsedStatement,
    params: &mut ParamStream<'_>,
    reserved: &ReservedWords,
    mut handler: F,
) -> Result<()>
where
    F: FnMut(Record) -> Result<bool>,
{
    if !statement.criteria.is_empty() {
        let table_schema = schema::key_names(client, &statement.table).await?;
        if criteria_matches_schema(&statement.criteria, &table_schema) {
            let key_map = criteria::extract_key_criteria(&statement.criteria, params)?;
            return point_lookup(client, &statement.table, &key_map, &mut handler).await;
        }
    }
    scan(client, statement, params, reserved, handler).await
}

/// Whether every criterion names a key attribute (or a composite tuple of
/// them) with cardinality matching the table's key schema exactly. This
/// is purely structural — it does not consume bind parameters — so the
/// fast path can decline without having touched the parameter stream.
fn criteria_matches_schema(criteria: &[crate::statement::Criterion], schema: &TableSchema) -> bool {
    let schema_names = schema.name_set();
    let mut criterion_names: HashSet<String> = HashSet::new();
    for criterion in criteria {
        if !matches!(criterion.op, ComparisonOp::Eq | ComparisonOp::In) {
            return false;
        }
        let columns = criterion.left.trim_matches(|c| c == '(' || c == ')').split(',').map(|s| s.trim().to_string());
        for column in columns {
            if !criterion_names.insert(column) {
                return false;
            }
        }
    }
    criterion_names.len() == schema_names.len() && criterion_names.iter().all(|c| schema_names.contains(c.as_str()))
}

async fn point_lookup<F>(
    client: &Client,
    table: &str,
    key_map: &CriteriaMap,
    handler: &mut F,
) -> Result<()>
where
    F: FnMut(Record) -> Result<bool>,
{
    for tuple in criteria::expand_key_tuples(key_map)? {
        let record: Record = tuple.into_iter().collect();
        let key = codec::encode(&record)?;
        let output = client
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| Error::store("GetItem", table, e))?;
        // A miss is not an error and is not retried as a Scan: the fast
        // path, once taken, owns the read.
        let Some(item) = output.item() else { continue };
        if !handler(codec::decode(item))? {
            return Ok(());
        }
    }
    Ok(())
}

async fn scan<F>(
    client: &Client,
    statement: &ParsedStatement,
    params: &mut ParamStream<'_>,
    reserved: &ReservedWords,
    mut handler: F,
) -> Result<()>
where
    F: FnMut(Record) -> Result<bool>,
{
    if is_count_star(statement) {
        return count_star(client, statement, handler).await;
    }

    let (projection, expr_names) = build_projection(statement, reserved);
    let filter = criteria::build_filter(&statement.criteria, params)?;

    let mut cursor = None;
    let mut first_page = true;
    let mut synthesized_projection: Option<String> = None;
    loop {
        let mut request = client.scan().table_name(&statement.table);
        if let Some(proj) = synthesized_projection.as_deref().or(projection.as_deref()) {
            request = request.projection_expression(proj);
        }
        if !expr_names.is_empty() {
            request = request.set_expression_attribute_names(Some(expr_names.clone()));
        }
        if let Some(f) = &filter {
            request = request.filter_expression(&f.expression);
            let values = f
                .values
                .iter()
                .map(|(k, v)| Ok((k.clone(), codec::encode_value(v)?)))
                .collect::<Result<HashMap<_, _>>>()?;
            request = request.set_expression_attribute_values(Some(values));
        }
        if let Some(start_key) = cursor.take() {
            request = request.set_exclusive_start_key(Some(start_key));
        }

        let output = request.send().await.map_err(|e| Error::store("Scan", &statement.table, e))?;

        if first_page && projection.is_none() {
            if let Some(first_item) = output.items().first() {
                synthesized_projection = Some(first_item.keys().cloned().collect::<Vec<_>>().join(", "));
            }
        }
        first_page = false;

        for item in output.items() {
            if !handler(codec::decode(item))? {
                return Ok(());
            }
        }

        match output.last_evaluated_key() {
            Some(next) if !next.is_empty() => cursor = Some(next.clone()),
            _ => break,
        }
    }
    Ok(())
}

fn is_count_star(statement: &ParsedStatement) -> bool {
    statement.columns.first().map(|c| c.expression.to_ascii_lowercase().starts_with("count")).unwrap_or(false)
}

async fn count_star<F>(client: &Client, statement: &ParsedStatement, mut handler: F) -> Result<()>
where
    F: FnMut(Record) -> Result<bool>,
{
    let mut total: i64 = 0;
    let mut cursor = None;
    loop {
        let mut request = client.scan().table_name(&statement.table).select(Select::Count);
        if let Some(start_key) = cursor.take() {
            request = request.set_exclusive_start_key(Some(start_key));
        }
        let output = request.send().await.map_err(|e| Error::store("Scan", &statement.table, e))?;
        total += i64::from(output.count());
        match output.last_evaluated_key() {
            Some(next) if !next.is_empty() => cursor = Some(next.clone()),
            _ => break,
        }
    }

    let label = statement.columns.first().and_then(|c| c.alias.clone()).unwrap_or_else(|| "count".to_string());
    let mut record = Record::new();
    record.insert(label, RecordValue::Integer(total));
    handler(record)?;
    Ok(())
}

fn build_projection(statement: &ParsedStatement, reserved: &ReservedWords) -> (Option<String>, HashMap<String, String>) {
    if statement.columns.is_empty() {
        return (None, HashMap::new());
    }
    let mut names = HashMap::new();
    let mut parts = Vec::with_capacity(statement.columns.len());
    for column in &statement.columns {
        if reserved.is_reserved(&column.name) {
            let alias = format!("#{}", column.name);
            names.insert(alias.clone(), column.name.clone());
            parts.push(alias);
        } else {
            parts.push(column.name.clone());
        }
    }
    (Some(parts.join(", ")), names)
}
