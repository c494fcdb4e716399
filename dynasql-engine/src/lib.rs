//! # dynasql-engine
//!
//! SQL-to-DynamoDB query translation and execution engine: parses a SQL
//! subset, classifies each statement by shape, chooses the most selective
//! DynamoDB primitive (`GetItem`, `Scan` with filter, or a
//! scan-with-deletion loop) given the table's key schema, encodes and
//! decodes between typed attribute values and untyped record maps,
//! paginates scans, and surfaces `COUNT(*)` aggregation.
//!
//! ## Architecture
//!
//! ```text
//! SQL text ──▶ parser ──▶ ParsedStatement
//!                               │
//!            ┌──────────────────┼──────────────────┐
//!            ▼                  ▼                  ▼
//!         criteria           schema              ddl
//!     (key/filter split)  (key names,         (CREATE/DROP
//!                           columns)             TABLE)
//!            │                  │
//!            └────────┬─────────┘
//!                      ▼
//!              dml / query executors ──▶ codec ──▶ Record
//! ```
//!
//! Credential resolution, connection pooling, and the outer driver-name
//! registry are thin ambient layers around this core; see [`connection`]
//! and [`registry`].

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod connection;
pub mod criteria;
pub mod ddl;
pub mod dml;
pub mod driver;
pub mod parser;
pub mod query;
pub mod registry;
pub mod schema;
pub mod statement;
pub mod value;

pub use connection::{ConnectionConfig, CredentialsResolver, Pool, PooledConnection};
pub use driver::{Driver, DynamoDbDriverFactory};
pub use registry::{open as open_driver, register_driver, DriverFactory};
pub use statement::{ParsedStatement, StatementKind};
pub use value::{Record, RecordValue};

pub use dynasql_common::{Error, ErrorKind, Result};
