//! Process-wide registry mapping a connection-string scheme to a database
//! constructor. Storage backends register themselves here instead of the
//! core depending on them directly.

use crate::config::DatabaseConfig;
use crate::error::CoreError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

/// Anything a registered scheme constructs. Kept deliberately opaque here;
/// concrete backends downcast or wrap this as they see fit.
pub trait RegisteredDatabase: Send + Sync {}
impl<T: Send + Sync> RegisteredDatabase for T {}

type Constructor = Box<dyn Fn(&DatabaseConfig) -> Result<Box<dyn std::any::Any + Send + Sync>, CoreError> + Send + Sync>;

static REGISTRY: Lazy<RwLock<HashMap<String, Constructor>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers `constructor` under `scheme`. Re-registering a scheme replaces
/// the previous constructor.
pub fn register_scheme(scheme: &str, constructor: Constructor) {
    REGISTRY.write().unwrap().insert(scheme.to_string(), constructor);
}

/// Builds whatever is registered for `config.scheme`, downcast by the
/// caller to the concrete backend type it expects.
pub fn construct(config: &DatabaseConfig) -> Result<Box<dyn std::any::Any + Send + Sync>, CoreError> {
    let registry = REGISTRY.read().unwrap();
    let constructor = registry
        .get(&config.scheme)
        .ok_or_else(|| CoreError::Config(format!("no database registered for scheme {:?}", config.scheme)))?;
    constructor(config)
}

pub fn is_registered(scheme: &str) -> bool {
    REGISTRY.read().unwrap().contains_key(scheme)
}
