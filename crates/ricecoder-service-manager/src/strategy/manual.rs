use tracing::debug;

use super::ResolverStrategy;
use crate::{Concrete, DIError, DIResult, DependencyKind, Instance, ServiceManager};

/// Dispatches on the kind of the stored entry.
///
/// - aliases resolve their target identifier
/// - invokables construct their class with no arguments
/// - factories construct their class with no arguments and invoke it with
///   the manager
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualStrategy;

impl ManualStrategy {
    fn resolve_alias(&self, id: &str, manager: &ServiceManager) -> DIResult<Instance> {
        let target = match manager.dependencies_manager().get(id)? {
            Concrete::Class(target) => target,
            Concrete::Callable(factory) => return factory(manager),
        };

        debug!("Resolving alias {} -> {}", id, target);
        manager.resolve(&target)
    }

    fn resolve_invokable(&self, id: &str, manager: &ServiceManager) -> DIResult<Instance> {
        let class = match manager.dependencies_manager().get(id)? {
            Concrete::Class(class) => class,
            Concrete::Callable(_) => {
                return Err(DIError::unresolvable(id, "invokable entry holds a callable"))
            }
        };

        manager.classes().instantiate(&class, Vec::new())
    }

    fn resolve_factory(&self, id: &str, manager: &ServiceManager) -> DIResult<Instance> {
        let class = match manager.dependencies_manager().get(id)? {
            Concrete::Class(class) => class,
            Concrete::Callable(factory) => return factory(manager),
        };

        let descriptor = manager
            .classes()
            .get(&class)
            .ok_or_else(|| DIError::UnknownClass {
                class: class.clone(),
            })?;
        let factory = descriptor.instantiate(Vec::new())?;

        descriptor.invoke(&factory, manager).unwrap_or_else(|| {
            Err(DIError::unresolvable(
                id,
                format!("factory class {} is not invokable", class),
            ))
        })
    }
}

impl ResolverStrategy for ManualStrategy {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn resolve(&self, id: &str, manager: &ServiceManager) -> DIResult<Instance> {
        match manager.dependencies_manager().get_type(id)? {
            DependencyKind::Alias => self.resolve_alias(id, manager),
            DependencyKind::Invokable => self.resolve_invokable(id, manager),
            DependencyKind::Factory => self.resolve_factory(id, manager),
        }
    }
}
