//! The service manager facade
//!
//! Owns the dependency repository, the class catalog and the active
//! resolution strategy, and enforces the override policy when whole
//! repositories are bound.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::ServiceManagerConfig;
use crate::repository::FactoryFn;
use crate::strategy::{AutoWiringStrategy, ResolverStrategy};
use crate::{ClassCatalog, ClassDescriptor, Concrete, DIError, DIResult, DependenciesRepository, Instance};

static MANAGER_COUNTER: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // identifiers currently being resolved on this thread, tagged by manager
    static RESOLVING: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks an identifier as in progress for the lifetime of the guard
struct ResolveGuard {
    manager: u64,
}

impl ResolveGuard {
    fn enter(manager: u64, id: &str) -> DIResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.iter().any(|(owner, active)| *owner == manager && active == id) {
                let mut chain: Vec<String> = stack
                    .iter()
                    .filter(|(owner, _)| *owner == manager)
                    .map(|(_, active)| active.clone())
                    .skip_while(|active| active != id)
                    .collect();
                chain.push(id.to_string());
                return Err(DIError::CyclicDependency { chain });
            }

            stack.push((manager, id.to_string()));
            Ok(Self { manager })
        })
    }
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|(owner, _)| *owner == self.manager) {
                stack.remove(position);
            }
        });
    }
}

/// Registry plus resolver: the entry point clients call
pub struct ServiceManager {
    id: u64,
    repository: DependenciesRepository,
    classes: ClassCatalog,
    strategy: Box<dyn ResolverStrategy>,
    allow_override: AtomicBool,
}

impl ServiceManager {
    /// Create an empty manager with the given strategy
    pub fn new<S: ResolverStrategy + 'static>(strategy: S, allow_override: bool) -> Self {
        Self::from_parts(
            DependenciesRepository::new(),
            ClassCatalog::new(),
            Box::new(strategy),
            allow_override,
        )
    }

    pub fn builder() -> ServiceManagerBuilder {
        ServiceManagerBuilder::new()
    }

    /// Build a manager from configuration, registering its dependencies
    pub fn from_config(config: &ServiceManagerConfig, classes: ClassCatalog) -> DIResult<Self> {
        let manager = Self::from_parts(
            DependenciesRepository::new(),
            classes,
            config.strategy.build(),
            config.allow_override,
        );
        manager.bind(&config.to_repository()?)?;
        Ok(manager)
    }

    fn from_parts(
        repository: DependenciesRepository,
        classes: ClassCatalog,
        strategy: Box<dyn ResolverStrategy>,
        allow_override: bool,
    ) -> Self {
        let id = MANAGER_COUNTER.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Creating service manager {} (strategy: {}, allow_override: {})",
            id,
            strategy.name(),
            allow_override
        );

        Self {
            id,
            repository,
            classes,
            strategy,
            allow_override: AtomicBool::new(allow_override),
        }
    }

    /// Produce the value for `id`.
    ///
    /// Callable entries are invoked with the manager; everything else,
    /// unknown identifiers included, goes to the active strategy.
    pub fn get(&self, id: &str) -> DIResult<Instance> {
        if self.has(id) {
            if let Concrete::Callable(factory) = self.repository.get(id)? {
                return self.call_factory(id, &factory);
            }
        }

        self.resolve(id)
    }

    /// [`get`](Self::get) followed by a downcast to `T`
    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> DIResult<Arc<T>> {
        self.get(id)?
            .downcast::<T>()
            .map_err(|_| DIError::TypeMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn has(&self, id: &str) -> bool {
        self.repository.has(id)
    }

    /// Resolve `id` through the active strategy
    pub fn resolve(&self, id: &str) -> DIResult<Instance> {
        let _guard = ResolveGuard::enter(self.id, id)?;
        trace!("Resolving {} with {} strategy", id, self.strategy.name());
        self.strategy.resolve(id, self)
    }

    /// Invoke a callable entry registered under `id`
    pub fn call_factory(&self, id: &str, factory: &FactoryFn) -> DIResult<Instance> {
        let _guard = ResolveGuard::enter(self.id, id)?;
        trace!("Invoking factory for {}", id);
        factory(self)
    }

    /// Merge every entry of `repository` into this manager.
    ///
    /// With override disallowed, any identifier that already exists fails the
    /// whole bind with [`DIError::DuplicateDependency`] before anything is
    /// written. With override allowed, incoming entries replace existing
    /// ones and take the incoming classification.
    pub fn bind(&self, repository: &DependenciesRepository) -> DIResult<()> {
        let incoming = repository.get_dependencies();
        let allow_override = self.allow_override();

        let mut partitions = self.repository.write();
        if !allow_override {
            if let Some(duplicate) = incoming.iter().find(|dep| partitions.contains(&dep.id)) {
                return Err(DIError::DuplicateDependency {
                    id: duplicate.id.clone(),
                });
            }
        }

        for dependency in &incoming {
            if partitions.remove(&dependency.id) {
                debug!("Overriding dependency {}", dependency.id);
            }
            partitions.insert(&dependency.id, dependency.kind, dependency.concrete.clone());
        }

        debug!("Bound {} dependencies", incoming.len());
        Ok(())
    }

    /// The owned repository; writes through it bypass the override policy
    pub fn dependencies_manager(&self) -> &DependenciesRepository {
        &self.repository
    }

    pub fn classes(&self) -> &ClassCatalog {
        &self.classes
    }

    pub fn allow_override(&self) -> bool {
        self.allow_override.load(Ordering::Acquire)
    }

    pub fn enable_override(&self, allow: bool) {
        self.allow_override.store(allow, Ordering::Release);
        debug!("Override {} for service manager {}", if allow { "enabled" } else { "disabled" }, self.id);
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new(AutoWiringStrategy, false)
    }
}

impl fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceManager")
            .field("id", &self.id)
            .field("strategy", &self.strategy.name())
            .field("allow_override", &self.allow_override())
            .field("repository", &self.repository)
            .field("classes", &self.classes)
            .finish()
    }
}

/// Builder pattern for configuring a service manager
pub struct ServiceManagerBuilder {
    strategy: Box<dyn ResolverStrategy>,
    allow_override: bool,
    classes: ClassCatalog,
    repository: Option<DependenciesRepository>,
}

impl ServiceManagerBuilder {
    pub fn new() -> Self {
        Self {
            strategy: Box::new(AutoWiringStrategy),
            allow_override: false,
            classes: ClassCatalog::new(),
            repository: None,
        }
    }

    pub fn strategy<S: ResolverStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Replace the class catalog
    pub fn catalog(mut self, classes: ClassCatalog) -> Self {
        self.classes = classes;
        self
    }

    /// Describe one more class
    pub fn class(self, descriptor: ClassDescriptor) -> Self {
        self.classes.register(descriptor);
        self
    }

    /// Add every class submitted through `inventory`
    pub fn with_discovered_classes(self) -> Self {
        for registration in inventory::iter::<crate::ClassRegistration> {
            self.classes.register((registration.describe)());
        }
        self
    }

    /// Entries bound when the manager is built
    pub fn repository(mut self, repository: DependenciesRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn build(self) -> DIResult<ServiceManager> {
        let manager = ServiceManager::from_parts(
            DependenciesRepository::new(),
            self.classes,
            self.strategy,
            self.allow_override,
        );

        if let Some(repository) = &self.repository {
            manager.bind(repository)?;
        }
        Ok(manager)
    }
}

impl Default for ServiceManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
