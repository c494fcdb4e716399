//! Driver-name → factory registration. Modeled as explicit registration
//! the host invokes once at start-up, not a hidden module-load side
//! effect.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dynasql_common::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::connection::ConnectionConfig;
use crate::driver::Driver;

/// Builds a [`Driver`] from a connection configuration. Implemented per
/// concrete driver; stored behind `Arc` so the registry can be shared
/// across threads cheaply.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open(&self, config: &ConnectionConfig) -> Result<Driver>;
}

static REGISTRY: Lazy<RwLock<HashMap<String, Arc<dyn DriverFactory>>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a driver factory under `name`. Re-registering the same name
/// replaces the previous factory.
pub fn register_driver(name: impl Into<String>, factory: Arc<dyn DriverFactory>) {
    REGISTRY.write().insert(name.into(), factory);
}

/// Opens a connection through the factory registered under `name`.
pub async fn open(name: &str, config: &ConnectionConfig) -> Result<Driver> {
    let factory = {
        let registry = REGISTRY.read();
        registry.get(name).cloned()
    }
    .ok_or_else(|| Error::Config(format!("no driver registered under {name:?}")))?;
    factory.open(config).await
}
