//! The small set of entrypoints a host invokes: `execute`, `query`, and
//! the DDL/introspection helpers. Every call acquires a pooled connection
//! and releases it on every exit path.

use async_trait::async_trait;
use dynasql_common::{Error, Result};
use tracing::instrument;

use crate::codec::TypeTag;
use crate::connection::{ConnectionConfig, CredentialsResolver, Pool};
use crate::criteria::ParamStream;
use crate::{ddl, dml, parser, query};
use crate::query::ReservedWords;
use crate::statement::StatementKind;
use crate::value::{Record, RecordValue};

pub struct Driver {
    pool: Pool,
    reserved_words: ReservedWords,
    dbname: Option<String>,
}

impl Driver {
    pub async fn connect(config: &ConnectionConfig, resolver: Option<&dyn CredentialsResolver>) -> Result<Self> {
        Ok(Self {
            pool: Pool::connect(config, resolver).await?,
            reserved_words: ReservedWords::default(),
            dbname: config.dbname.clone(),
        })
    }

    /// The logical datastore name this driver was configured with, if any.
    #[must_use]
    pub fn current_datastore(&self) -> Option<&str> {
        self.dbname.as_deref()
    }

    /// Registers an additional reserved identifier to escape in
    /// projections.
    pub fn reserve_word(&mut self, word: impl Into<String>) {
        self.reserved_words.reserve(word);
    }

    /// `INSERT`, `UPDATE`, `DELETE`, `CREATE TABLE`, or `DROP TABLE`.
    #[instrument(skip(self, params))]
    pub async fn execute(&self, sql: &str, params: &[RecordValue]) -> Result<u64> {
        let statement = parser::parse(sql)?;
        let mut stream = ParamStream::new(params);
        let connection = self.pool.acquire().await;
        let rows_affected = match statement.kind {
            StatementKind::Insert => dml::insert(connection.client, &statement, &mut stream).await?.rows_affected,
            StatementKind::Update => dml::update(connection.client, &statement, &mut stream).await?.rows_affected,
            StatementKind::Delete => dml::delete(connection.client, &statement, &mut stream).await?.rows_affected,
            StatementKind::Create => ddl::create_table(connection.client, &statement).await?.rows_affected,
            StatementKind::Drop => ddl::drop_table(connection.client, &statement).await?.rows_affected,
            StatementKind::Select => return Err(Error::Unsupported("use `query` for SELECT statements".into())),
        };
        Ok(rows_affected)
    }

    /// `SELECT`. Rows are emitted through `handler`, which returns
    /// `Ok(false)` to stop iteration early.
    #[instrument(skip(self, params, handler))]
    pub async fn query<F>(&self, sql: &str, params: &[RecordValue], mut handler: F) -> Result<()>
    where
        F: FnMut(Record) -> Result<bool>,
    {
        let statement = parser::parse(sql)?;
        if statement.kind != StatementKind::Select {
            return Err(Error::Unsupported("use `execute` for non-SELECT statements".into()));
        }
        let mut stream = ParamStream::new(params);
        let connection = self.pool.acquire().await;
        query::select(connection.client, &statement, &mut stream, &self.reserved_words, &mut handler).await
    }

    pub async fn create_table(&self, sql: &str) -> Result<u64> {
        let statement = parser::parse(sql)?;
        let connection = self.pool.acquire().await;
        Ok(ddl::create_table(connection.client, &statement).await?.rows_affected)
    }

    pub async fn drop_table(&self, sql: &str) -> Result<u64> {
        let statement = parser::parse(sql)?;
        let connection = self.pool.acquire().await;
        Ok(ddl::drop_table(connection.client, &statement).await?.rows_affected)
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let connection = self.pool.acquire().await;
        let mut names = Vec::new();
        let mut cursor = None;
        loop {
            let mut request = connection.client.list_tables();
            if let Some(start) = cursor.take() {
                request = request.exclusive_start_table_name(start);
            }
            let output = request.send().await.map_err(|e| Error::store("ListTables", "*", e))?;
            names.extend(output.table_names().iter().cloned());
            match output.last_evaluated_table_name() {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }
        Ok(names)
    }

    pub async fn get_columns(&self, table: &str) -> Result<Vec<(String, TypeTag)>> {
        let connection = self.pool.acquire().await;
        crate::schema::columns(connection.client, table).await
    }

    pub async fn get_key_name(&self, table: &str) -> Result<String> {
        let connection = self.pool.acquire().await;
        let schema = crate::schema::key_names(connection.client, table).await?;
        Ok(schema.key_names().join(","))
    }
}

/// The registrable factory for this engine's one built-in driver.
pub struct DynamoDbDriverFactory {
    pub resolver: Option<std::sync::Arc<dyn CredentialsResolver>>,
}

#[async_trait]
impl crate::registry::DriverFactory for DynamoDbDriverFactory {
    async fn open(&self, config: &ConnectionConfig) -> Result<Driver> {
        Driver::connect(config, self.resolver.as_deref()).await
    }
}
