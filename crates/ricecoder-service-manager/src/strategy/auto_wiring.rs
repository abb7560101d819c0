use tracing::{debug, trace};

use super::ResolverStrategy;
use crate::reflection::{ClassDescriptor, ParameterDescriptor, ParameterType, TypeRef};
use crate::{Concrete, DIError, DIResult, Instance, ServiceManager};

/// Builds classes by walking their described constructor parameters.
///
/// The entry for an identifier names a class; the class descriptor decides
/// how it is built:
///
/// 1. non-instantiable classes fail with [`DIError::NotInstantiable`]
/// 2. classes with an invoke capability are built without arguments and
///    invoked with the manager
/// 3. otherwise every constructor parameter is resolved in declaration
///    order and passed positionally
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoWiringStrategy;

enum Entry {
    Class(String),
    Resolved(Instance),
}

impl AutoWiringStrategy {
    /// Class name backing `id`, or the instance when `id` maps to a callable
    fn entry(&self, id: &str, manager: &ServiceManager) -> DIResult<Entry> {
        let repository = manager.dependencies_manager();

        if repository.has(id) {
            return match repository.get(id)? {
                Concrete::Class(class) => Ok(Entry::Class(class)),
                // already guarded by the enclosing resolve
                Concrete::Callable(factory) => factory(manager).map(Entry::Resolved),
            };
        }

        if manager.classes().contains(id) {
            trace!("{} is not registered, using it as a class name", id);
            return Ok(Entry::Class(id.to_string()));
        }

        Err(DIError::unknown(id))
    }

    fn resolve_parameter(
        &self,
        class: &str,
        parameter: &ParameterDescriptor,
        manager: &ServiceManager,
    ) -> DIResult<Instance> {
        let type_ref = match &parameter.ty {
            ParameterType::Untyped => {
                return Err(DIError::MissingTypeHint {
                    class: class.to_string(),
                    parameter: parameter.name.clone(),
                })
            }
            ParameterType::Union(types) if types.len() > 1 => {
                return Err(DIError::UnsupportedUnionType {
                    class: class.to_string(),
                    parameter: parameter.name.clone(),
                    types: types.iter().map(|t| t.name.clone()).collect(),
                })
            }
            ParameterType::Union(types) => match types.first() {
                Some(type_ref) => type_ref,
                None => {
                    return Err(DIError::MissingTypeHint {
                        class: class.to_string(),
                        parameter: parameter.name.clone(),
                    })
                }
            },
            ParameterType::Named(type_ref) => type_ref,
        };

        trace!(
            "Resolving param {} of {} as {}",
            parameter.name,
            class,
            type_ref.name
        );
        self.resolve_type(class, &parameter.name, type_ref, manager)
    }

    fn resolve_type(
        &self,
        class: &str,
        parameter: &str,
        type_ref: &TypeRef,
        manager: &ServiceManager,
    ) -> DIResult<Instance> {
        let repository = manager.dependencies_manager();

        if repository.has(&type_ref.name) {
            return match repository.get(&type_ref.name)? {
                Concrete::Class(target) => manager.resolve(&target),
                Concrete::Callable(factory) => manager.call_factory(&type_ref.name, &factory),
            };
        }

        if type_ref.builtin {
            return Err(DIError::UnresolvableParameter {
                class: class.to_string(),
                parameter: parameter.to_string(),
                type_name: type_ref.name.clone(),
            });
        }

        manager.resolve(&type_ref.name)
    }

    fn build(
        &self,
        id: &str,
        descriptor: &ClassDescriptor,
        manager: &ServiceManager,
    ) -> DIResult<Instance> {
        let class = descriptor.name();

        if !descriptor.is_instantiable() {
            return Err(DIError::NotInstantiable {
                class: class.to_string(),
            });
        }

        if descriptor.is_invokable() {
            let factory = descriptor.instantiate(Vec::new())?;
            if let Some(result) = descriptor.invoke(&factory, manager) {
                return result;
            }
        }

        let parameters = match descriptor.parameters() {
            Some(parameters) if !parameters.is_empty() => parameters,
            _ => return descriptor.instantiate(Vec::new()),
        };

        let mut dependencies = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            dependencies.push(self.resolve_parameter(class, parameter, manager)?);
        }

        debug!(
            "Auto-wired {} ({}) with {} dependencies",
            id,
            class,
            dependencies.len()
        );
        descriptor.instantiate(dependencies)
    }
}

impl ResolverStrategy for AutoWiringStrategy {
    fn name(&self) -> &'static str {
        "auto_wiring"
    }

    fn resolve(&self, id: &str, manager: &ServiceManager) -> DIResult<Instance> {
        let class = match self.entry(id, manager)? {
            Entry::Class(class) => class,
            Entry::Resolved(instance) => return Ok(instance),
        };

        match manager.classes().get(&class) {
            Some(descriptor) => self.build(id, &descriptor, manager),
            // the entry names another registered identifier rather than a class
            None if class != id && manager.has(&class) => manager.resolve(&class),
            None => Err(DIError::UnknownClass { class }),
        }
    }
}
