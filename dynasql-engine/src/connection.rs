//! Connection configuration and a small semaphore-backed pool. Credential
//! resolution, pooling, and SDK transport are deliberately thin here; the
//! client they hand back is the only shared resource a statement acquires.

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::Client;
use aws_types::region::Region;
use dynasql_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

/// Resolves an opaque `credentials` locator into a key/secret pair.
/// Implemented by the host when [`ConnectionConfig::credentials`] is set;
/// explicit `key`/`secret` on the config always win over this.
pub trait CredentialsResolver: Send + Sync {
    fn resolve(&self, locator: &str) -> Result<(String, String)>;
}

/// Recognized connection options. Deserializable so a host can load it
/// straight out of a config file alongside its other settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Static access key id.
    pub key: Option<String>,
    /// Static secret access key.
    pub secret: Option<String>,
    /// Store region; required — empty is a `ConfigError`.
    pub region: String,
    /// Override URL. `host:port` without a scheme is prefixed with
    /// `http://`; without a port, `:8000` is appended (the local emulator
    /// convention).
    pub endpoint: Option<String>,
    /// Logical datastore name reported by introspection helpers.
    pub dbname: Option<String>,
    /// Opaque resource locator read by a [`CredentialsResolver`].
    pub credentials: Option<String>,
    /// Caps concurrent checkouts from the pool; defaults to 1 (sequential
    /// usage, to bound SDK concurrency on small clients).
    pub max_pool_size: Option<usize>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn normalized_endpoint(&self) -> Option<String> {
        self.endpoint.as_deref().map(normalize_endpoint)
    }
}

fn normalize_endpoint(raw: &str) -> String {
    let with_scheme = if raw.contains("://") { raw.to_string() } else { format!("http://{raw}") };
    let host_port = with_scheme.rsplit('/').next().unwrap_or("");
    if host_port.contains(':') {
        with_scheme
    } else {
        format!("{with_scheme}:8000")
    }
}

/// A pooled DynamoDB client. `MaxPoolSize` concurrent checkouts are
/// allowed; `acquire` awaits a permit and releases it on drop, so release
/// is guaranteed on every exit path including error and panic.
pub struct Pool {
    client: Client,
    semaphore: Arc<Semaphore>,
}

/// A checked-out connection. Dropping it releases the pool permit.
pub struct PooledConnection<'a> {
    pub client: &'a Client,
    _permit: SemaphorePermit<'a>,
}

impl Pool {
    pub async fn connect(config: &ConnectionConfig, resolver: Option<&dyn CredentialsResolver>) -> Result<Self> {
        if config.region.is_empty() {
            return Err(Error::Config("region is required".into()));
        }

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        let static_creds = match (&config.key, &config.secret) {
            (Some(key), Some(secret)) => Some((key.clone(), secret.clone())),
            _ => match (&config.credentials, resolver) {
                (Some(locator), Some(resolver)) => Some(resolver.resolve(locator)?),
                _ => None,
            },
        };
        if let Some((key, secret)) = static_creds {
            loader = loader.credentials_provider(Credentials::new(key, secret, None, None, "dynasql"));
        }
        if let Some(endpoint) = config.normalized_endpoint() {
            debug!(endpoint, "overriding store endpoint");
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);
        let max_pool_size = config.max_pool_size.unwrap_or(1).max(1);
        Ok(Self { client, semaphore: Arc::new(Semaphore::new(max_pool_size)) })
    }

    /// Acquires a connection, waiting for a free pool permit if necessary.
    pub async fn acquire(&self) -> PooledConnection<'_> {
        let permit = self.semaphore.acquire().await.expect("connection pool semaphore is never closed");
        PooledConnection { client: &self.client, _permit: permit }
    }
}
