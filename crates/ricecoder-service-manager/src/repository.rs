//! Dependency entries keyed by identifier
//!
//! The repository holds three disjoint partitions (factories, invokables and
//! aliases). It performs no resolution and no override checks; those belong
//! to [`ServiceManager`](crate::ServiceManager).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::error::ensure_identifier;
use crate::{DIError, DIResult, Instance, ServiceManager};

/// A producer invoked with the service manager as its single argument
pub type FactoryFn = Arc<dyn Fn(&ServiceManager) -> DIResult<Instance> + Send + Sync>;

/// The kind of a registered entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Alias,
    Invokable,
    Factory,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Alias => "alias",
            DependencyKind::Invokable => "invokable",
            DependencyKind::Factory => "factory",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stored value of an entry
#[derive(Clone)]
pub enum Concrete {
    /// A class name (or, for aliases, another identifier)
    Class(String),
    /// A callable producer
    Callable(FactoryFn),
}

impl Concrete {
    /// Wrap a closure producing any shareable value
    pub fn callable<F, T>(factory: F) -> Self
    where
        F: Fn(&ServiceManager) -> DIResult<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Concrete::Callable(Arc::new(move |manager: &ServiceManager| -> DIResult<Instance> {
            Ok(Arc::new(factory(manager)?))
        }))
    }

    /// Wrap a closure that already produces a type-erased instance
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn(&ServiceManager) -> DIResult<Instance> + Send + Sync + 'static,
    {
        Concrete::Callable(Arc::new(factory))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Concrete::Callable(_))
    }

    /// The class name, `None` for callables
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Concrete::Class(name) => Some(name),
            Concrete::Callable(_) => None,
        }
    }
}

impl From<&str> for Concrete {
    fn from(name: &str) -> Self {
        Concrete::Class(name.to_string())
    }
}

impl From<String> for Concrete {
    fn from(name: String) -> Self {
        Concrete::Class(name)
    }
}

impl From<FactoryFn> for Concrete {
    fn from(factory: FactoryFn) -> Self {
        Concrete::Callable(factory)
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Class(name) => f.debug_tuple("Class").field(name).finish(),
            Concrete::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// One row of the merged dependency view
#[derive(Debug, Clone)]
pub struct Dependency {
    pub id: String,
    pub kind: DependencyKind,
    pub concrete: Concrete,
}

/// An insertion-ordered map for a single partition
#[derive(Clone)]
struct Partition<V> {
    values: HashMap<String, V>,
    order: Vec<String>,
}

impl<V: Clone> Partition<V> {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, id: &str, value: V) {
        if self.values.insert(id.to_string(), value).is_none() {
            self.order.push(id.to_string());
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        if self.values.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
            return true;
        }
        false
    }

    fn get(&self, id: &str) -> Option<&V> {
        self.values.get(id)
    }

    fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    fn entries(&self) -> Vec<(String, V)> {
        self.order
            .iter()
            .filter_map(|id| self.values.get(id).map(|value| (id.clone(), value.clone())))
            .collect()
    }
}

#[derive(Clone)]
pub(crate) struct Partitions {
    factories: Partition<Concrete>,
    invokables: Partition<String>,
    aliases: Partition<String>,
}

impl Partitions {
    fn new() -> Self {
        Self {
            factories: Partition::new(),
            invokables: Partition::new(),
            aliases: Partition::new(),
        }
    }

    pub(crate) fn kind(&self, id: &str) -> Option<DependencyKind> {
        if self.aliases.contains(id) {
            Some(DependencyKind::Alias)
        } else if self.invokables.contains(id) {
            Some(DependencyKind::Invokable)
        } else if self.factories.contains(id) {
            Some(DependencyKind::Factory)
        } else {
            None
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.kind(id).is_some()
    }

    fn value(&self, id: &str) -> Option<Concrete> {
        if let Some(target) = self.aliases.get(id) {
            return Some(Concrete::Class(target.clone()));
        }
        if let Some(class) = self.invokables.get(id) {
            return Some(Concrete::Class(class.clone()));
        }
        self.factories.get(id).cloned()
    }

    /// Write an entry into the partition matching `kind`
    pub(crate) fn insert(&mut self, id: &str, kind: DependencyKind, concrete: Concrete) {
        match kind {
            DependencyKind::Alias => {
                let target = match concrete {
                    Concrete::Class(target) => target,
                    Concrete::Callable(_) => {
                        // aliases only ever hold identifiers
                        self.factories.insert(id, concrete);
                        return;
                    }
                };
                self.aliases.insert(id, target);
            }
            DependencyKind::Invokable => self.invokables.insert(id, id.to_string()),
            DependencyKind::Factory => self.factories.insert(id, concrete),
        }
    }

    /// Drop `id` from every partition
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let factory = self.factories.remove(id);
        let invokable = self.invokables.remove(id);
        let alias = self.aliases.remove(id);
        factory || invokable || alias
    }

    fn dependencies(&self) -> Vec<Dependency> {
        let mut seen = std::collections::HashSet::new();
        let ids = self
            .factories
            .order
            .iter()
            .chain(self.invokables.order.iter())
            .chain(self.aliases.order.iter());

        let mut merged = Vec::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let (Some(kind), Some(concrete)) = (self.kind(id), self.value(id)) {
                merged.push(Dependency {
                    id: id.clone(),
                    kind,
                    concrete,
                });
            }
        }
        merged
    }

    fn len(&self) -> usize {
        self.dependencies().len()
    }
}

/// Registry of factories, invokables and aliases
pub struct DependenciesRepository {
    partitions: RwLock<Partitions>,
}

impl DependenciesRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(Partitions::new()),
        }
    }

    /// Register a factory producing the value for `id`
    pub fn set_factory(&self, id: &str, concrete: impl Into<Concrete>) -> DIResult<()> {
        ensure_identifier(id)?;
        let concrete = concrete.into();
        if let Concrete::Class(class) = &concrete {
            ensure_identifier(class)?;
        }

        debug!("Registered factory: {} -> {:?}", id, concrete);
        self.partitions
            .write()
            .insert(id, DependencyKind::Factory, concrete);
        Ok(())
    }

    /// Register `id` as a class constructible without arguments
    pub fn set_invokable(&self, id: &str) -> DIResult<()> {
        ensure_identifier(id)?;

        debug!("Registered invokable: {}", id);
        self.partitions
            .write()
            .insert(id, DependencyKind::Invokable, Concrete::Class(id.to_string()));
        Ok(())
    }

    /// Register `id` as a redirection to `concrete`
    pub fn set_alias(&self, id: &str, concrete: &str) -> DIResult<()> {
        ensure_identifier(id)?;
        ensure_identifier(concrete)?;

        debug!("Registered alias: {} -> {}", id, concrete);
        self.partitions.write().insert(
            id,
            DependencyKind::Alias,
            Concrete::Class(concrete.to_string()),
        );
        Ok(())
    }

    /// Kind of `id`, checking aliases, then invokables, then factories
    pub fn get_type(&self, id: &str) -> DIResult<DependencyKind> {
        self.partitions
            .read()
            .kind(id)
            .ok_or_else(|| DIError::unknown(id))
    }

    pub fn has(&self, id: &str) -> bool {
        self.partitions.read().contains(id)
    }

    /// Stored value of `id`, with the same precedence as [`get_type`](Self::get_type)
    pub fn get(&self, id: &str) -> DIResult<Concrete> {
        self.partitions
            .read()
            .value(id)
            .ok_or_else(|| DIError::unknown(id))
    }

    /// Merged view across all partitions.
    ///
    /// Rows are ordered by first appearance in factories, then invokables,
    /// then aliases; each row carries the precedence-winning kind and value.
    pub fn get_dependencies(&self) -> Vec<Dependency> {
        self.partitions.read().dependencies()
    }

    pub fn factories(&self) -> Vec<(String, Concrete)> {
        self.partitions.read().factories.entries()
    }

    pub fn invokables(&self) -> Vec<(String, String)> {
        self.partitions.read().invokables.entries()
    }

    pub fn aliases(&self) -> Vec<(String, String)> {
        self.partitions.read().aliases.entries()
    }

    /// Number of distinct identifiers
    pub fn len(&self) -> usize {
        self.partitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Partitions> {
        self.partitions.write()
    }
}

impl Default for DependenciesRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DependenciesRepository {
    fn clone(&self) -> Self {
        Self {
            partitions: RwLock::new(self.partitions.read().clone()),
        }
    }
}

impl fmt::Debug for DependenciesRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.get_dependencies()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_keeps_insertion_order() {
        let mut partition = Partition::new();
        partition.insert("b", 1);
        partition.insert("a", 2);
        partition.insert("b", 3);

        assert_eq!(
            partition.entries(),
            vec![("b".to_string(), 3), ("a".to_string(), 2)]
        );
        assert!(partition.remove("b"));
        assert!(!partition.remove("b"));
        assert_eq!(partition.entries(), vec![("a".to_string(), 2)]);
    }

    #[test]
    fn test_merged_view_order_and_precedence() {
        let repository = DependenciesRepository::new();
        repository.set_alias("shared", "Target").unwrap();
        repository.set_invokable("Target").unwrap();
        repository.set_factory("shared", "SharedFactory").unwrap();
        repository.set_factory("first", "FirstFactory").unwrap();

        let merged = repository.get_dependencies();
        let ids: Vec<&str> = merged.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["shared", "first", "Target"]);

        // "shared" sits in the factory and alias partitions; the alias wins
        assert_eq!(merged[0].kind, DependencyKind::Alias);
        assert_eq!(merged[0].concrete.class_name(), Some("Target"));
        assert_eq!(repository.len(), 3);
    }

    #[test]
    fn test_callable_alias_lands_in_factories() {
        let mut partitions = Partitions::new();
        partitions.insert(
            "clock",
            DependencyKind::Alias,
            Concrete::callable(|_| Ok(7u8)),
        );
        assert_eq!(partitions.kind("clock"), Some(DependencyKind::Factory));
    }

    #[test]
    fn test_remove_clears_every_partition() {
        let mut partitions = Partitions::new();
        partitions.insert("x", DependencyKind::Factory, Concrete::from("X"));
        partitions.insert("x", DependencyKind::Alias, Concrete::from("y"));
        assert!(partitions.remove("x"));
        assert!(!partitions.contains("x"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DependencyKind::Invokable.to_string(), "invokable");
    }
}
