//! Error taxonomy for the dynasql SQL-to-DynamoDB adapter.
//!
//! The variants mirror the failure modes a caller can actually distinguish
//! and act on (retry, surface to the user, fix their SQL) rather than the
//! internal module that raised them.

use std::fmt;

use thiserror::Error;

/// Result type alias using dynasql's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the query translation and execution engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing region, malformed endpoint, or another misconfigured connection option.
    #[error("configuration error: {0}")]
    Config(String),

    /// The SQL text could not be parsed.
    #[error("failed to parse SQL: {0}")]
    Parse(String),

    /// A SQL construct is recognized but not supported by this engine
    /// (e.g. a comparison operator other than `=`/`IN`, `OR`, `PersistBatch`).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// `UPDATE` was issued without a `WHERE` clause.
    #[error("UPDATE requires a WHERE clause identifying the key")]
    EmptyCriteria,

    /// The WHERE clause is malformed for criteria extraction: a duplicate
    /// column on the left-hand side, or a composite-key `IN` whose value
    /// count isn't a multiple of the key arity.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),

    /// The positional parameter stream was exhausted before every `?`
    /// placeholder was resolved.
    #[error("missing bind parameter for: {0}")]
    MissingBind(String),

    /// A record value cannot be represented in DynamoDB's typed attribute model.
    #[error("value not representable as a DynamoDB attribute: {0}")]
    Codec(String),

    /// The underlying store rejected or failed a request.
    #[error("{operation} on table {table:?} failed: {source}")]
    Store {
        operation: &'static str,
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A DDL wait loop (CREATE/DROP TABLE) exceeded its budget before the
    /// table reached the expected state. Non-fatal: callers may choose to
    /// retry or proceed.
    #[error("timed out waiting for table {table:?} to become ready")]
    Timeout { table: String },
}

impl Error {
    /// Build a [`Error::Store`] from any store client error, tagging it
    /// with the operation and table that produced it.
    pub fn store(
        operation: &'static str,
        table: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Store {
            operation,
            table: table.into(),
            source: Box::new(source),
        }
    }
}

/// Helper for callers that want to match on error *kind* without the
/// payload (e.g. deciding whether an `UnsupportedError` should be reported
/// to the user verbatim).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Parse,
    Unsupported,
    EmptyCriteria,
    InvalidCriteria,
    MissingBind,
    Codec,
    Store,
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "ConfigError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Unsupported => "UnsupportedError",
            ErrorKind::EmptyCriteria => "EmptyCriteriaError",
            ErrorKind::InvalidCriteria => "InvalidCriteriaError",
            ErrorKind::MissingBind => "MissingBindError",
            ErrorKind::Codec => "CodecError",
            ErrorKind::Store => "StoreError",
            ErrorKind::Timeout => "TimeoutError",
        };
        f.write_str(name)
    }
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::EmptyCriteria => ErrorKind::EmptyCriteria,
            Error::InvalidCriteria(_) => ErrorKind::InvalidCriteria,
            Error::MissingBind(_) => ErrorKind::MissingBind,
            Error::Codec(_) => ErrorKind::Codec,
            Error::Store { .. } => ErrorKind::Store,
            Error::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_matches_variant() {
        assert_eq!(Error::EmptyCriteria.kind(), ErrorKind::EmptyCriteria);
        assert_eq!(
            Error::InvalidCriteria("dup".into()).kind(),
            ErrorKind::InvalidCriteria
        );
        assert_eq!(Error::Config("no region".into()).kind(), ErrorKind::Config);
    }

    #[test]
    fn store_error_wraps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = Error::store("Scan", "music", io_err);
        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(err.to_string().contains("Scan"));
        assert!(err.to_string().contains("music"));
    }
}
