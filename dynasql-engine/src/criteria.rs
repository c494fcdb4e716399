//! Criteria analysis: turning a parsed `WHERE` clause plus a positional
//! parameter stream into either a key-equality map (point lookup) or a
//! server-side filter expression (scan).

use std::collections::HashMap;

use dynasql_common::{Error, Result};

use crate::statement::{ComparisonOp, Criterion};
use crate::value::RecordValue;

/// One bound value in a [`CriteriaMap`]: a scalar for `=`, a sequence for
/// `IN`.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaValue {
    Scalar(RecordValue),
    Seq(Vec<RecordValue>),
}

/// The normalized form the analyzer emits: column name (or composite key
/// `"(a,b)"`) to bound value. Each column appears at most once.
pub type CriteriaMap = HashMap<String, CriteriaValue>;

/// An ordered, single-consumption view over positional bind parameters.
pub struct ParamStream<'a> {
    values: &'a [RecordValue],
    pos: usize,
}

impl<'a> ParamStream<'a> {
    #[must_use]
    pub fn new(values: &'a [RecordValue]) -> Self {
        Self { values, pos: 0 }
    }

    /// Consumes and returns the next bound value, or `MissingBindError`
    /// tagged with `context` (typically the column being bound) if the
    /// stream is exhausted.
    pub fn next(&mut self, context: &str) -> Result<RecordValue> {
        let value = self
            .values
            .get(self.pos)
            .cloned()
            .ok_or_else(|| Error::MissingBind(context.to_string()))?;
        self.pos += 1;
        Ok(value)
    }

    /// The values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [RecordValue] {
        &self.values[self.pos..]
    }
}

/// Strips a single pair of surrounding single quotes, if present.
#[must_use]
pub fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parses a literal operand into its best-effort typed value: integer,
/// then float, then a quote-stripped string.
#[must_use]
pub fn parse_literal(raw: &str) -> RecordValue {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        RecordValue::Integer(i)
    } else if let Ok(f) = trimmed.parse::<f64>() {
        RecordValue::Float(f)
    } else {
        RecordValue::String(strip_quotes(trimmed))
    }
}

fn looks_like_identifier(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty()
        && !trimmed.starts_with('?')
        && !trimmed.starts_with('\'')
        && !trimmed.starts_with('(')
        && !trimmed.chars().next().unwrap().is_ascii_digit()
}

/// Determines which operand names the column and which carries the value.
fn identify_column(criterion: &Criterion) -> (String, String) {
    if looks_like_identifier(&criterion.left) {
        (criterion.left.clone(), criterion.right.clone())
    } else if looks_like_identifier(&criterion.right) {
        (criterion.right.clone(), criterion.left.clone())
    } else {
        (criterion.left.clone(), criterion.right.clone())
    }
}

/// Key-equality mode: used by `UPDATE`, `DELETE`, and the point-lookup
/// fast path for `SELECT`.
pub fn extract_key_criteria(criteria: &[Criterion], params: &mut ParamStream) -> Result<CriteriaMap> {
    let mut map = CriteriaMap::new();
    for criterion in criteria {
        if !matches!(criterion.op, ComparisonOp::Eq | ComparisonOp::In) {
            return Err(Error::Unsupported(format!(
                "operator not supported in key criteria: {:?}",
                criterion.op
            )));
        }
        let (column, value_expr) = identify_column(criterion);
        if map.contains_key(&column) {
            return Err(Error::InvalidCriteria(format!("duplicate column {column:?} in WHERE clause")));
        }
        let placeholder_count = value_expr.matches('?').count();
        let value = match placeholder_count {
            0 => CriteriaValue::Scalar(parse_literal(&value_expr)),
            1 => CriteriaValue::Scalar(params.next(&column)?),
            n => {
                let mut seq = Vec::with_capacity(n);
                for _ in 0..n {
                    seq.push(params.next(&column)?);
                }
                CriteriaValue::Seq(seq)
            }
        };
        map.insert(column, value);
    }
    Ok(map)
}

/// Filter-expression mode: used by `Scan`. Consumes all remaining
/// parameters, substituting each `?` in criterion text with a generated
/// `:pN` placeholder.
pub struct FilterExpr {
    pub expression: String,
    pub values: HashMap<String, RecordValue>,
}

pub fn build_filter(criteria: &[Criterion], params: &mut ParamStream) -> Result<Option<FilterExpr>> {
    if criteria.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(criteria.len());
    let mut values = HashMap::new();
    let mut counter = 0usize;
    for criterion in criteria {
        let op_text = match criterion.op {
            ComparisonOp::Eq => "=",
            ComparisonOp::In => "IN",
            ComparisonOp::Other => {
                return Err(Error::Unsupported(format!(
                    "operator not supported in filter expressions: {:?}",
                    criterion.op
                )))
            }
        };
        let mut right = criterion.right.clone();
        while right.contains('?') {
            counter += 1;
            let placeholder = format!(":p{counter}");
            let value = params.next(&criterion.left)?;
            values.insert(placeholder.clone(), value);
            right = right.replacen('?', &placeholder, 1);
        }
        parts.push(format!("{} {} {}", criterion.left, op_text, right));
    }
    Ok(Some(FilterExpr { expression: parts.join(" AND "), values }))
}

/// Expands a [`CriteriaMap`] into one key map per tuple the caller must
/// act on (a `GetItem`, a point `DeleteItem`, …). A composite-key `IN`
/// entry fans out into one tuple per chunk of its arity; scalar columns
/// are copied into every tuple unchanged.
pub fn expand_key_tuples(map: &CriteriaMap) -> Result<Vec<HashMap<String, RecordValue>>> {
    let mut base: HashMap<String, RecordValue> = HashMap::new();
    let mut composite: Option<(Vec<String>, Vec<RecordValue>)> = None;

    for (key, value) in map {
        if key.contains(',') {
            let columns: Vec<String> =
                key.trim_matches(|c| c == '(' || c == ')').split(',').map(|s| s.trim().to_string()).collect();
            let CriteriaValue::Seq(values) = value else {
                return Err(Error::InvalidCriteria(format!("composite key {key:?} requires an IN (...) list")));
            };
            if values.is_empty() || values.len() % columns.len() != 0 {
                return Err(Error::InvalidCriteria(format!(
                    "composite key {key:?}: {} bound values is not a multiple of arity {}",
                    values.len(),
                    columns.len()
                )));
            }
            composite = Some((columns, values.clone()));
        } else {
            // Deliberate deviation from processCriteria's Go behavior, which has no
            // guard here: a non-comma key name with a multi-value list is passed
            // straight through to the single handler call, letting the list leak
            // into a single-value slot. Rejecting it outright is narrower but avoids
            // silently building a key map with a list where a scalar is expected.
            let scalar = match value {
                CriteriaValue::Scalar(v) => v.clone(),
                CriteriaValue::Seq(values) if values.len() == 1 => values[0].clone(),
                CriteriaValue::Seq(_) => {
                    return Err(Error::Unsupported(format!("IN with multiple values on single column {key:?}")))
                }
            };
            base.insert(key.clone(), scalar);
        }
    }

    Ok(match composite {
        None => vec![base],
        Some((columns, values)) => values
            .chunks(columns.len())
            .map(|chunk| {
                let mut tuple = base.clone();
                for (col, val) in columns.iter().zip(chunk) {
                    tuple.insert(col.clone(), val.clone());
                }
                tuple
            })
            .collect(),
    })
}

/// Invokes `handler` once per tuple from [`expand_key_tuples`], stopping
/// early if the handler returns `Ok(false)`.
pub fn for_each_key_tuple<F>(map: &CriteriaMap, mut handler: F) -> Result<()>
where
    F: FnMut(HashMap<String, RecordValue>) -> Result<bool>,
{
    for tuple in expand_key_tuples(map)? {
        if !handler(tuple)? {
            break;
        }
    }
    Ok(())
}
