//! String-keyed Service Manager for RiceCoder
//!
//! This crate maps identifiers to instructions for producing instances
//! (factories, invokables and aliases) and resolves them, either by
//! dispatching on the stored entry kind or by auto-wiring class
//! constructors from their described parameter types.
//!
//! ## Quick Start
//!
//! ```rust
//! use ricecoder_service_manager::{Concrete, ServiceManager};
//!
//! let manager = ServiceManager::default();
//! manager
//!     .dependencies_manager()
//!     .set_factory("answer", Concrete::callable(|_| Ok(42i32)))
//!     .unwrap();
//!
//! let answer = manager.get_as::<i32>("answer").unwrap();
//! assert_eq!(*answer, 42);
//! ```
//!
//! ## Auto-wiring
//!
//! ```rust
//! use ricecoder_service_manager::{ClassDescriptor, ParameterDescriptor, ServiceManager};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Transport;
//!
//! struct Mailer {
//!     transport: Arc<Transport>,
//! }
//!
//! let manager = ServiceManager::builder()
//!     .class(ClassDescriptor::of::<Transport>().with_name("Transport"))
//!     .class(
//!         ClassDescriptor::new("Mailer", |args| Ok(Mailer { transport: args.get::<Transport>(0)? }))
//!             .with_constructor(vec![ParameterDescriptor::class("transport", "Transport")]),
//!     )
//!     .build()
//!     .unwrap();
//!
//! manager.dependencies_manager().set_invokable("Transport").unwrap();
//! manager.dependencies_manager().set_invokable("Mailer").unwrap();
//!
//! let mailer = manager.get_as::<Mailer>("Mailer").unwrap();
//! # let _ = &mailer.transport;
//! ```

pub mod config;
pub mod error;
pub mod instances;
pub mod manager;
pub mod provider;
pub mod reflection;
pub mod registration;
pub mod repository;
pub mod strategy;

use std::any::Any;
use std::sync::Arc;

/// A type-erased, shareable instance produced by resolution
pub type Instance = Arc<dyn Any + Send + Sync>;

pub use config::ServiceManagerConfig;
pub use error::{DIError, DIResult};
pub use instances::InstanceStore;
pub use manager::{ServiceManager, ServiceManagerBuilder};
pub use provider::{ConfigServiceProvider, ServiceProvider, ServiceProviderRegistry};
pub use reflection::{
    class_name, is_builtin_type, ClassCatalog, ClassDescriptor, ConstructorArgs, Invoke,
    ParameterDescriptor, ParameterType, TypeRef,
};
pub use registration::{discovered_class_count, list_discovered_classes, ClassRegistration};
pub use repository::{Concrete, DependenciesRepository, Dependency, DependencyKind, FactoryFn};
pub use strategy::{AutoWiringStrategy, ManualStrategy, ResolverStrategy, StrategyKind};

/// Convenience macro for registering a callable factory
#[macro_export]
macro_rules! register_factory {
    ($manager:expr, $id:expr, $factory:expr) => {
        $manager
            .dependencies_manager()
            .set_factory($id, $crate::Concrete::callable($factory))
    };
}

/// Convenience macro for resolving and downcasting a service
#[macro_export]
macro_rules! resolve_service {
    ($manager:expr, $id:expr, $service_type:ty) => {
        $manager.get_as::<$service_type>($id)
    };
}
