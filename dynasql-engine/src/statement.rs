//! The shape a parsed SQL statement takes before it reaches the criteria
//! analyzer, schema probe, DDL translator, or DML/query executors. This is
//! the "polymorphic collaborator surface" every other module consumes —
//! a plain data shape, not a trait hierarchy.

/// The statement kinds this engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
}

/// Comparison operators the parser recognizes. Only `Eq` and `In` are
/// handled past the criteria analyzer; `Other` lets the engine report
/// `UnsupportedError` instead of failing at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    In,
    Other,
}

/// A single comparison in a `WHERE` clause, joined to its neighbors by
/// `AND`. `left`/`right` are the textual operands as written (an
/// identifier, a composite tuple like `(Artist, SongTitle)`, a `?`
/// placeholder, a literal, or a parenthesized placeholder list).
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub left: String,
    pub op: ComparisonOp,
    pub right: String,
}

/// One projected column in a `SELECT` list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub name: String,
    pub expression: String,
    pub alias: Option<String>,
}

/// A value or placeholder on the right-hand side of an `INSERT` column
/// list or an `UPDATE … SET` assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Placeholder,
    Literal(String),
}

/// One `(column, value)` pair from an `INSERT` column/value list or an
/// `UPDATE … SET` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: ValueExpr,
}

/// The two roles a key attribute can play in a store key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Hash,
    Range,
}

/// A column definition inside `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    pub key_role: Option<KeyRole>,
}

/// The normalized view every downstream module consumes, regardless of
/// which concrete parser produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub kind: StatementKind,
    pub table: String,
    pub columns: Vec<SelectColumn>,
    pub criteria: Vec<Criterion>,
    pub assignments: Vec<Assignment>,
    pub column_defs: Vec<ColumnDef>,
    pub if_not_exists: bool,
    pub if_exists: bool,
}

impl ParsedStatement {
    /// A blank statement of the given kind; callers fill in the fields
    /// their statement shape actually uses.
    pub(crate) fn empty() -> Self {
        Self {
            kind: StatementKind::Select,
            table: String::new(),
            columns: Vec::new(),
            criteria: Vec::new(),
            assignments: Vec::new(),
            column_defs: Vec::new(),
            if_not_exists: false,
            if_exists: false,
        }
    }
}
