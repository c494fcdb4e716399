//! SQL parsing. `CREATE TABLE`'s key-role syntax (`HASH KEY`, `SORT KEY`,
//! …) is not standard SQL, so it is parsed by hand; every other statement
//! shape goes through `sqlparser`.

use sqlparser::ast::{
    Assignment as SqlAssignment, BinaryOperator, Expr, FromTable, Ident, ObjectName, ObjectType, Query, SelectItem,
    SetExpr, Statement, TableFactor, TableWithJoins, Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use dynasql_common::{Error, Result};

use crate::criteria::strip_quotes;
use crate::statement::{
    Assignment, ColumnDef, ComparisonOp, Criterion, KeyRole, ParsedStatement, SelectColumn, StatementKind, ValueExpr,
};

/// Parses one SQL statement into the engine's normalized
/// [`ParsedStatement`] shape.
pub fn parse(sql: &str) -> Result<ParsedStatement> {
    let trimmed = sql.trim_start();
    if starts_with_keyword(trimmed, "CREATE") {
        parse_create_table(trimmed)
    } else {
        parse_with_sqlparser(sql)
    }
}

fn parse_with_sqlparser(sql: &str) -> Result<ParsedStatement> {
    let dialect = GenericDialect {};
    let mut statements = Parser::parse_sql(&dialect, sql).map_err(|e| Error::Parse(e.to_string()))?;
    if statements.len() != 1 {
        return Err(Error::Parse(format!("expected exactly one statement, found {}", statements.len())));
    }
    match statements.remove(0) {
        Statement::Query(query) => parse_select(*query),
        Statement::Insert { table_name, columns, source, .. } => parse_insert(table_name, columns, source),
        Statement::Update { table, assignments, selection, .. } => parse_update(table, assignments, selection),
        Statement::Delete { from, selection, .. } => parse_delete(from, selection),
        Statement::Drop { object_type: ObjectType::Table, if_exists, mut names, .. } => {
            let table = names.pop().ok_or_else(|| Error::Parse("DROP TABLE requires a table name".into()))?;
            Ok(ParsedStatement { kind: StatementKind::Drop, table: table.to_string(), if_exists, ..ParsedStatement::empty() })
        }
        other => Err(Error::Unsupported(format!("statement not supported: {other}"))),
    }
}

fn parse_select(query: Query) -> Result<ParsedStatement> {
    let SetExpr::Select(select) = *query.body else {
        return Err(Error::Unsupported("only simple SELECT queries are supported".into()));
    };
    let table = select
        .from
        .first()
        .and_then(|twj| table_name_from_factor(&twj.relation))
        .ok_or_else(|| Error::Parse("SELECT requires a FROM table".into()))?;

    let mut columns = Vec::new();
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) => {
                columns.push(SelectColumn { name: column_name(expr), expression: expr.to_string(), alias: None });
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                columns.push(SelectColumn {
                    name: column_name(expr),
                    expression: expr.to_string(),
                    alias: Some(alias.value.clone()),
                });
            }
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {}
        }
    }

    let criteria = select.selection.as_ref().map(criteria_from_expr).transpose()?.unwrap_or_default();

    Ok(ParsedStatement { kind: StatementKind::Select, table, columns, criteria, ..ParsedStatement::empty() })
}

fn parse_insert(table_name: ObjectName, columns: Vec<Ident>, source: Option<Box<Query>>) -> Result<ParsedStatement> {
    let source = source.ok_or_else(|| Error::Unsupported("INSERT requires a VALUES list".into()))?;
    let SetExpr::Values(values) = *source.body else {
        return Err(Error::Unsupported("INSERT source must be a VALUES list".into()));
    };
    let row = values.rows.into_iter().next().ok_or_else(|| Error::Parse("INSERT VALUES has no rows".into()))?;
    if row.len() != columns.len() {
        return Err(Error::Parse(format!(
            "INSERT column count {} does not match value count {}",
            columns.len(),
            row.len()
        )));
    }
    let assignments =
        columns.into_iter().zip(row).map(|(column, expr)| Assignment { column: column.value, value: value_expr_from(&expr) }).collect();

    Ok(ParsedStatement { kind: StatementKind::Insert, table: table_name.to_string(), assignments, ..ParsedStatement::empty() })
}

fn parse_update(table: TableWithJoins, assignments: Vec<SqlAssignment>, selection: Option<Expr>) -> Result<ParsedStatement> {
    let table_name = table_name_from_factor(&table.relation).ok_or_else(|| Error::Parse("UPDATE requires a table name".into()))?;
    let assignments = assignments
        .into_iter()
        .map(|a| Assignment { column: a.id.last().map(|i| i.value.clone()).unwrap_or_default(), value: value_expr_from(&a.value) })
        .collect();
    let criteria = selection.as_ref().map(criteria_from_expr).transpose()?.unwrap_or_default();

    Ok(ParsedStatement { kind: StatementKind::Update, table: table_name, assignments, criteria, ..ParsedStatement::empty() })
}

fn parse_delete(from: FromTable, selection: Option<Expr>) -> Result<ParsedStatement> {
    let tables = match from {
        FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
    };
    let table_name = tables
        .first()
        .and_then(|twj| table_name_from_factor(&twj.relation))
        .ok_or_else(|| Error::Parse("DELETE requires a FROM table".into()))?;
    let criteria = selection.as_ref().map(criteria_from_expr).transpose()?.unwrap_or_default();

    Ok(ParsedStatement { kind: StatementKind::Delete, table: table_name, criteria, ..ParsedStatement::empty() })
}

fn column_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.clone()).unwrap_or_else(|| expr.to_string()),
        other => other.to_string(),
    }
}

fn table_name_from_factor(factor: &TableFactor) -> Option<String> {
    match factor {
        TableFactor::Table { name, .. } => Some(name.to_string()),
        _ => None,
    }
}

fn value_expr_from(expr: &Expr) -> ValueExpr {
    match expr {
        Expr::Value(SqlValue::Placeholder(_)) => ValueExpr::Placeholder,
        other => ValueExpr::Literal(strip_quotes(&other.to_string())),
    }
}

fn criteria_from_expr(expr: &Expr) -> Result<Vec<Criterion>> {
    let mut leaves = Vec::new();
    flatten_and(expr, &mut leaves);
    leaves.into_iter().map(criterion_from_leaf).collect()
}

fn flatten_and<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    if let Expr::BinaryOp { left, op: BinaryOperator::And, right } = expr {
        flatten_and(left, out);
        flatten_and(right, out);
    } else {
        out.push(expr);
    }
}

fn criterion_from_leaf(expr: &Expr) -> Result<Criterion> {
    match expr {
        Expr::BinaryOp { left, op, right } => {
            let comparison = match op {
                BinaryOperator::Eq => ComparisonOp::Eq,
                _ => ComparisonOp::Other,
            };
            Ok(Criterion { left: left.to_string(), op: comparison, right: right.to_string() })
        }
        Expr::InList { expr: inner, list, negated: false } => {
            let right = format!("({})", list.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "));
            Ok(Criterion { left: inner.to_string(), op: ComparisonOp::In, right })
        }
        other => Ok(Criterion { left: other.to_string(), op: ComparisonOp::Other, right: String::new() }),
    }
}

// --- CREATE TABLE: hand-rolled, since key-role annotations aren't standard SQL ---

fn parse_create_table(sql: &str) -> Result<ParsedStatement> {
    let rest = strip_keyword(sql, "CREATE").ok_or_else(|| Error::Parse("expected CREATE".into()))?;
    let rest = strip_keyword(rest.trim_start(), "TABLE").ok_or_else(|| Error::Parse("expected TABLE".into()))?;
    let mut rest = rest.trim_start();

    let if_not_exists = if let Some(after_if) = strip_keyword(rest, "IF") {
        let after_not =
            strip_keyword(after_if.trim_start(), "NOT").ok_or_else(|| Error::Parse("expected NOT after IF".into()))?;
        let after_exists = strip_keyword(after_not.trim_start(), "EXISTS")
            .ok_or_else(|| Error::Parse("expected EXISTS after IF NOT".into()))?;
        rest = after_exists.trim_start();
        true
    } else {
        false
    };

    let paren_start = rest.find('(').ok_or_else(|| Error::Parse("expected column list".into()))?;
    let table = rest[..paren_start].trim().to_string();
    let remainder = &rest[paren_start..];
    let close = matching_paren(remainder)?;
    let column_list = &remainder[1..close];

    let mut column_defs = Vec::new();
    for column_text in split_top_level(column_list, ',') {
        let column_text = column_text.trim();
        if column_text.is_empty() {
            continue;
        }
        let mut tokens = column_text.split_whitespace();
        let name = tokens.next().ok_or_else(|| Error::Parse(format!("empty column definition: {column_text:?}")))?.to_string();
        let sql_type = tokens.next().ok_or_else(|| Error::Parse(format!("column {name:?} has no type")))?.to_string();
        let key_words: Vec<&str> = tokens.collect();
        column_defs.push(ColumnDef { name, sql_type, key_role: key_role_from_words(&key_words) });
    }
    if table.is_empty() {
        return Err(Error::Parse("CREATE TABLE requires a table name".into()));
    }

    Ok(ParsedStatement { kind: StatementKind::Create, table, if_not_exists, column_defs, ..ParsedStatement::empty() })
}

fn key_role_from_words(words: &[&str]) -> Option<KeyRole> {
    let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
    if upper.iter().any(|w| w == "HASH" || w == "PRIMARY") {
        Some(KeyRole::Hash)
    } else if upper.iter().any(|w| w == "SORT" || w == "RANGE") {
        Some(KeyRole::Range)
    } else {
        None
    }
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    if s.len() >= keyword.len() && s.as_bytes()[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes()) {
        Some(&s[keyword.len()..])
    } else {
        None
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    strip_keyword(s, keyword).is_some()
}

fn matching_paren(s: &str) -> Result<usize> {
    let mut depth = 0i32;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(Error::Parse("unbalanced parentheses in column list".into()))
}

fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in s.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            c if c == sep && depth == 0 => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_select_with_key_equality() {
        let statement = parse("SELECT Artist, SongTitle FROM music WHERE Artist = ? AND SongTitle = ?").unwrap();
        assert_eq!(statement.kind, StatementKind::Select);
        assert_eq!(statement.table, "music");
        assert_eq!(statement.criteria.len(), 2);
        assert_eq!(statement.criteria[0].op, ComparisonOp::Eq);
    }

    #[test]
    fn parses_select_count_star() {
        let statement = parse("SELECT COUNT(*) FROM music").unwrap();
        assert_eq!(statement.columns.len(), 1);
        assert!(statement.columns[0].expression.to_ascii_lowercase().starts_with("count"));
    }

    #[test]
    fn parses_in_list_predicate() {
        let statement = parse("SELECT Artist FROM music WHERE Artist IN (?, ?)").unwrap();
        assert_eq!(statement.criteria[0].op, ComparisonOp::In);
        assert_eq!(statement.criteria[0].right, "(?, ?)");
    }

    #[test]
    fn parses_insert_values() {
        let statement = parse("INSERT INTO music (Artist, SongTitle, ReleaseYear) VALUES (?, ?, 2000)").unwrap();
        assert_eq!(statement.kind, StatementKind::Insert);
        assert_eq!(statement.assignments.len(), 3);
        assert_eq!(statement.assignments[0].value, ValueExpr::Placeholder);
        assert_eq!(statement.assignments[2].value, ValueExpr::Literal("2000".into()));
    }

    #[test]
    fn parses_update_set_and_where() {
        let statement = parse("UPDATE music SET Price = ? WHERE Artist = ? AND SongTitle = ?").unwrap();
        assert_eq!(statement.kind, StatementKind::Update);
        assert_eq!(statement.assignments[0].column, "Price");
        assert_eq!(statement.criteria.len(), 2);
    }

    #[test]
    fn parses_delete_without_where() {
        let statement = parse("DELETE FROM music").unwrap();
        assert_eq!(statement.kind, StatementKind::Delete);
        assert!(statement.criteria.is_empty());
    }

    #[test]
    fn parses_drop_table_if_exists() {
        let statement = parse("DROP TABLE IF EXISTS music").unwrap();
        assert_eq!(statement.kind, StatementKind::Drop);
        assert!(statement.if_exists);
    }

    #[test]
    fn parses_create_table_with_key_roles() {
        let statement = parse(
            "CREATE TABLE IF NOT EXISTS music (Artist string HASH KEY, SongTitle string RANGE KEY, ReleaseYear int)",
        )
        .unwrap();
        assert_eq!(statement.kind, StatementKind::Create);
        assert!(statement.if_not_exists);
        assert_eq!(statement.column_defs.len(), 3);
        assert_eq!(statement.column_defs[0].key_role, Some(KeyRole::Hash));
        assert_eq!(statement.column_defs[1].key_role, Some(KeyRole::Range));
        assert_eq!(statement.column_defs[2].key_role, None);
    }

    #[test]
    fn parses_create_table_primary_and_sort_key() {
        let statement = parse("CREATE TABLE t (id int PRIMARY KEY, ts int SORT KEY)").unwrap();
        assert_eq!(statement.column_defs[0].key_role, Some(KeyRole::Hash));
        assert_eq!(statement.column_defs[1].key_role, Some(KeyRole::Range));
    }
}
