//! Shared-instance store
//!
//! The service manager never caches what it builds. Code that wants a value
//! reused across lookups keeps it here, either set directly or resolved once
//! through [`InstanceStore::resolve_shared`].

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::ensure_identifier;
use crate::{DIError, DIResult, Instance, ServiceManager};

/// Identifier to already-built instance
#[derive(Default)]
pub struct InstanceStore {
    instances: RwLock<HashMap<String, Instance>>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: &str, instance: Instance) -> DIResult<()> {
        ensure_identifier(id)?;
        self.instances.write().insert(id.to_string(), instance);
        debug!("Stored shared instance: {}", id);
        Ok(())
    }

    pub fn has(&self, id: &str) -> bool {
        self.instances.read().contains_key(id)
    }

    pub fn get(&self, id: &str) -> DIResult<Instance> {
        self.instances
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DIError::unknown(id))
    }

    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> DIResult<Arc<T>> {
        self.get(id)?
            .downcast::<T>()
            .map_err(|_| DIError::TypeMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn remove(&self, id: &str) -> Option<Instance> {
        self.instances.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    pub fn clear(&self) {
        let mut instances = self.instances.write();
        let count = instances.len();
        instances.clear();
        debug!("Cleared {} shared instances", count);
    }

    /// Cached instance for `id`, resolving it through `manager` on first use.
    ///
    /// Resolution runs without holding the store lock; if two callers race,
    /// the first stored instance is kept and returned to both.
    pub fn resolve_shared(&self, id: &str, manager: &ServiceManager) -> DIResult<Instance> {
        if let Some(instance) = self.instances.read().get(id) {
            return Ok(instance.clone());
        }

        let instance = manager.get(id)?;
        let mut instances = self.instances.write();
        Ok(instances.entry(id.to_string()).or_insert(instance).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Concrete;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_get_remove() {
        let store = InstanceStore::new();
        store.set("answer", Arc::new(42u32)).unwrap();

        assert!(store.has("answer"));
        assert_eq!(*store.get_as::<u32>("answer").unwrap(), 42);
        assert!(store.remove("answer").is_some());
        assert!(matches!(
            store.get("answer"),
            Err(DIError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn test_resolve_shared_builds_once() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);

        let manager = ServiceManager::default();
        manager
            .dependencies_manager()
            .set_factory(
                "counter",
                Concrete::callable(|_| {
                    BUILDS.fetch_add(1, Ordering::SeqCst);
                    Ok(String::from("built"))
                }),
            )
            .unwrap();

        let store = InstanceStore::new();
        let first = store.resolve_shared("counter", &manager).unwrap();
        let second = store.resolve_shared("counter", &manager).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_empty_identifier() {
        let store = InstanceStore::new();
        assert!(matches!(
            store.set("", Arc::new(1u8)),
            Err(DIError::InvalidIdentifier)
        ));
    }
}
