//! Class descriptors standing in for runtime reflection
//!
//! Auto-wiring needs to know, for a class name, whether the class can be
//! constructed, whether it exposes an invoke capability, and the declared
//! types of its constructor parameters. Rust has no runtime reflection, so
//! each class is described once with a [`ClassDescriptor`] and stored in a
//! [`ClassCatalog`] keyed by class name.
//!
//! ```rust
//! use ricecoder_service_manager::{ClassCatalog, ClassDescriptor, ParameterDescriptor};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Clock;
//!
//! struct Scheduler {
//!     clock: Arc<Clock>,
//! }
//!
//! let catalog = ClassCatalog::new();
//! catalog.register(ClassDescriptor::of::<Clock>().with_name("Clock"));
//! catalog.register(
//!     ClassDescriptor::new("Scheduler", |args| Ok(Scheduler { clock: args.get::<Clock>(0)? }))
//!         .with_constructor(vec![ParameterDescriptor::class("clock", "Clock")]),
//! );
//! assert!(catalog.contains("Scheduler"));
//! ```

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::RwLock;
use tracing::debug;

use crate::{DIError, DIResult, Instance, ServiceManager};

type BuildFn = Arc<dyn Fn(ConstructorArgs) -> anyhow::Result<Instance> + Send + Sync>;
type InvokeFn = Arc<dyn Fn(&Instance, &ServiceManager) -> DIResult<Instance> + Send + Sync>;

const BUILTIN_TYPES: &[&str] = &[
    "bool", "char", "str", "&str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64", "()", "alloc::string::String", "String",
    "int", "float", "string", "array", "mixed", "iterable", "callable", "object",
];

/// Whether a type name denotes a primitive/built-in type rather than a class
pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

/// Class name used by [`ClassDescriptor::of`] for `T`
pub fn class_name<T: ?Sized>() -> &'static str {
    type_name::<T>()
}

/// Invoke capability of single-purpose factory classes.
///
/// A class implementing `Invoke` is constructed with no arguments and then
/// called with the service manager; the call's result is what gets resolved.
pub trait Invoke: Send + Sync + 'static {
    fn invoke(&self, manager: &ServiceManager) -> DIResult<Instance>;
}

/// A type reference carried by a parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub builtin: bool,
}

impl TypeRef {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin: false,
        }
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin: true,
        }
    }

    /// Classify `name` using the built-in type table
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let builtin = is_builtin_type(&name);
        Self { name, builtin }
    }
}

/// Declared type of a constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    /// No type declaration
    Untyped,
    /// A single declared type
    Named(TypeRef),
    /// Several alternative declared types
    Union(Vec<TypeRef>),
}

/// One constructor parameter, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: ParameterType,
}

impl ParameterDescriptor {
    /// Parameter typed with the class name of `T`
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Named(TypeRef::named(type_name::<T>())),
        }
    }

    pub fn class(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Named(TypeRef::class(type_name)),
        }
    }

    pub fn builtin(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Named(TypeRef::builtin(type_name)),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Untyped,
        }
    }

    pub fn union<I, S>(name: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            ty: ParameterType::Union(types.into_iter().map(TypeRef::named).collect()),
        }
    }
}

/// Resolved dependencies handed positionally to a class builder
pub struct ConstructorArgs {
    class: String,
    values: Vec<Instance>,
}

impl ConstructorArgs {
    pub(crate) fn new(class: &str, values: Vec<Instance>) -> Self {
        Self {
            class: class.to_string(),
            values,
        }
    }

    /// Downcast the argument at `index` to `T`
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        let value = self.values.get(index).ok_or_else(|| {
            anyhow!("{} expects an argument at position {}", self.class, index)
        })?;

        value.clone().downcast::<T>().map_err(|_| {
            anyhow!(
                "argument {} of {} is not a {}",
                index,
                self.class,
                type_name::<T>()
            )
        })
    }

    /// The raw argument at `index`
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything auto-wiring needs to know about one class
#[derive(Clone)]
pub struct ClassDescriptor {
    name: String,
    constructor: Option<Vec<ParameterDescriptor>>,
    build: Option<BuildFn>,
    invoker: Option<InvokeFn>,
}

impl ClassDescriptor {
    /// Describe a constructible class with a builder.
    ///
    /// The class has no declared constructor until
    /// [`with_constructor`](Self::with_constructor) is called.
    pub fn new<F, T>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(ConstructorArgs) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        let build: BuildFn = Arc::new(move |args: ConstructorArgs| -> anyhow::Result<Instance> {
            Ok(Arc::new(build(args)?))
        });
        Self {
            name: name.into(),
            constructor: None,
            build: Some(build),
            invoker: None,
        }
    }

    /// Describe `T` as a class constructed through `Default`
    pub fn of<T: Default + Any + Send + Sync>() -> Self {
        Self::new(type_name::<T>(), |_| Ok(T::default()))
    }

    /// Describe `T` as a zero-argument class exposing an invoke capability
    pub fn invokable<T: Invoke + Default>() -> Self {
        Self::of::<T>().with_invoker::<T>()
    }

    /// Describe a class that can never be constructed
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            build: None,
            invoker: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare the constructor's parameters in declaration order
    pub fn with_constructor(mut self, parameters: Vec<ParameterDescriptor>) -> Self {
        self.constructor = Some(parameters);
        self
    }

    /// Attach the invoke capability of `T` to instances built by this descriptor
    pub fn with_invoker<T: Invoke>(mut self) -> Self {
        let class = self.name.clone();
        let invoker: InvokeFn = Arc::new(move |instance: &Instance, manager: &ServiceManager| {
            let target = (**instance).downcast_ref::<T>().ok_or_else(|| DIError::TypeMismatch {
                id: class.clone(),
                expected: type_name::<T>(),
            })?;
            target.invoke(manager)
        });
        self.invoker = Some(invoker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_instantiable(&self) -> bool {
        self.build.is_some()
    }

    pub fn is_invokable(&self) -> bool {
        self.invoker.is_some()
    }

    /// Declared constructor parameters, `None` when there is no constructor
    pub fn parameters(&self) -> Option<&[ParameterDescriptor]> {
        self.constructor.as_deref()
    }

    /// Build an instance from positional arguments
    pub fn instantiate(&self, values: Vec<Instance>) -> DIResult<Instance> {
        let build = self.build.as_ref().ok_or_else(|| DIError::NotInstantiable {
            class: self.name.clone(),
        })?;

        build(ConstructorArgs::new(&self.name, values)).map_err(|source| {
            DIError::ConstructionFailed {
                class: self.name.clone(),
                source,
            }
        })
    }

    /// Run the invoke capability on an instance, `None` if the class has none
    pub fn invoke(&self, instance: &Instance, manager: &ServiceManager) -> Option<DIResult<Instance>> {
        self.invoker
            .as_ref()
            .map(|invoker| invoker(instance, manager))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("constructor", &self.constructor)
            .field("instantiable", &self.is_instantiable())
            .field("invokable", &self.is_invokable())
            .finish()
    }
}

/// Class descriptors keyed by class name
#[derive(Default)]
pub struct ClassCatalog {
    classes: RwLock<HashMap<String, Arc<ClassDescriptor>>>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a class description
    pub fn register(&self, descriptor: ClassDescriptor) {
        let name = descriptor.name.clone();
        let replaced = self
            .classes
            .write()
            .insert(name.clone(), Arc::new(descriptor))
            .is_some();

        debug!(class = %name, replaced, "Described class in catalog");
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Sorted class names
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Construct a described class from positional arguments
    pub fn instantiate(&self, name: &str, values: Vec<Instance>) -> DIResult<Instance> {
        let descriptor = self.get(name).ok_or_else(|| DIError::UnknownClass {
            class: name.to_string(),
        })?;
        descriptor.instantiate(values)
    }
}

impl fmt::Debug for ClassCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCatalog")
            .field("classes", &self.class_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Engine;

    struct Car {
        engine: Arc<Engine>,
    }

    #[test]
    fn test_builtin_classification() {
        assert!(TypeRef::named("i32").builtin);
        assert!(TypeRef::named("string").builtin);
        assert!(!TypeRef::named("Engine").builtin);
        assert_eq!(
            ParameterDescriptor::of::<i32>("count").ty,
            ParameterType::Named(TypeRef::builtin("i32"))
        );
    }

    #[test]
    fn test_instantiate_with_positional_args() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassDescriptor::of::<Engine>().with_name("Engine"));
        catalog.register(
            ClassDescriptor::new("Car", |args| Ok(Car { engine: args.get::<Engine>(0)? }))
                .with_constructor(vec![ParameterDescriptor::class("engine", "Engine")]),
        );

        let engine = catalog.instantiate("Engine", Vec::new()).unwrap();
        let car = catalog.instantiate("Car", vec![engine]).unwrap();
        let car = car.downcast::<Car>().unwrap();
        assert_eq!(Arc::strong_count(&car.engine), 1);
    }

    #[test]
    fn test_missing_argument_is_construction_failure() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassDescriptor::new("Car", |args| {
            Ok(Car { engine: args.get::<Engine>(0)? })
        }));

        let err = catalog.instantiate("Car", Vec::new()).unwrap_err();
        assert!(matches!(err, DIError::ConstructionFailed { ref class, .. } if class == "Car"));
    }

    #[test]
    fn test_abstract_class_not_instantiable() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassDescriptor::abstract_class("Shape"));

        assert!(!catalog.get("Shape").unwrap().is_instantiable());
        assert!(matches!(
            catalog.instantiate("Shape", Vec::new()),
            Err(DIError::NotInstantiable { .. })
        ));
    }

    #[test]
    fn test_unknown_class() {
        let catalog = ClassCatalog::new();
        assert!(matches!(
            catalog.instantiate("Ghost", Vec::new()),
            Err(DIError::UnknownClass { .. })
        ));
    }

    #[test]
    fn test_class_names_sorted() {
        let catalog = ClassCatalog::new();
        catalog.register(ClassDescriptor::abstract_class("b"));
        catalog.register(ClassDescriptor::abstract_class("a"));
        assert_eq!(catalog.class_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(catalog.len(), 2);
    }
}
