//! Service providers for bootstrapping a service manager
//!
//! A provider registers a group of dependencies and may finish its setup
//! from configuration once every provider has registered.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ricecoder_service_manager::{DIResult, ServiceManager, ServiceProvider};
//!
//! pub struct MailProvider;
//!
//! impl ServiceProvider for MailProvider {
//!     fn name(&self) -> &'static str {
//!         "mail"
//!     }
//!
//!     fn register(&self, manager: &ServiceManager) -> DIResult<()> {
//!         manager.dependencies_manager().set_invokable("Mailer")?;
//!         manager.dependencies_manager().set_alias("mailer", "Mailer")?;
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::{DIError, DIResult, ServiceManager, ServiceManagerConfig};

// ============================================================================
// ServiceProvider Trait
// ============================================================================

/// Trait for types that contribute dependencies to a service manager.
pub trait ServiceProvider: Send + Sync {
    /// Returns the name of this service provider.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Returns the priority of this service provider.
    ///
    /// Lower values are registered first. Default is 100.
    fn priority(&self) -> u32 {
        100
    }

    /// Register dependencies with the manager.
    fn register(&self, manager: &ServiceManager) -> DIResult<()>;

    /// Finish setup from configuration.
    ///
    /// Called after every provider has registered.
    #[allow(unused_variables)]
    fn boot(&self, manager: &ServiceManager, config: &ServiceManagerConfig) -> DIResult<()> {
        Ok(())
    }

    /// Check that required dependencies are present.
    ///
    /// Called after every provider has booted.
    #[allow(unused_variables)]
    fn validate(&self, manager: &ServiceManager) -> DIResult<()> {
        Ok(())
    }
}

// ============================================================================
// ServiceProviderRegistry
// ============================================================================

/// Registry for managing service providers.
///
/// Runs providers in priority order: all registrations, then all boots,
/// then all validations.
pub struct ServiceProviderRegistry {
    providers: Vec<Arc<dyn ServiceProvider>>,
}

impl ServiceProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a service provider to the registry.
    pub fn add<P: ServiceProvider + 'static>(&mut self, provider: P) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add a shared service provider to the registry.
    pub fn add_boxed(&mut self, provider: Arc<dyn ServiceProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in the order they will run.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.sorted().iter().map(|p| p.name()).collect()
    }

    fn sorted(&self) -> Vec<&Arc<dyn ServiceProvider>> {
        // stable sort keeps insertion order for equal priorities
        let mut sorted: Vec<_> = self.providers.iter().collect();
        sorted.sort_by_key(|p| p.priority());
        sorted
    }

    /// Register, boot and validate every provider against `manager`.
    pub fn register_all(
        &self,
        manager: &ServiceManager,
        config: &ServiceManagerConfig,
    ) -> DIResult<()> {
        let sorted = self.sorted();

        tracing::info!("Registering {} service providers", sorted.len());

        for provider in &sorted {
            tracing::debug!(
                "Registering provider '{}' (priority: {})",
                provider.name(),
                provider.priority()
            );
            provider.register(manager)?;
        }

        for provider in &sorted {
            tracing::debug!("Booting provider '{}'", provider.name());
            provider.boot(manager, config)?;
        }

        for provider in &sorted {
            provider.validate(manager)?;
        }

        tracing::info!("All service providers registered successfully");
        Ok(())
    }
}

impl Default for ServiceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ConfigServiceProvider
// ============================================================================

/// Applies [`ServiceManagerConfig`] to a manager.
///
/// Boot sets the override flag from `allow_override`, then binds the
/// configured dependencies, so the override policy decides collisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigServiceProvider;

impl ServiceProvider for ConfigServiceProvider {
    fn name(&self) -> &'static str {
        "config"
    }

    fn register(&self, _manager: &ServiceManager) -> DIResult<()> {
        Ok(())
    }

    fn boot(&self, manager: &ServiceManager, config: &ServiceManagerConfig) -> DIResult<()> {
        manager.enable_override(config.allow_override);
        manager.bind(&config.to_repository()?)?;

        tracing::debug!(
            "Bound {} configured dependencies",
            config.dependencies.len()
        );
        Ok(())
    }

    fn validate(&self, manager: &ServiceManager) -> DIResult<()> {
        for (id, target) in manager.dependencies_manager().aliases() {
            if !manager.has(&target) && !manager.classes().contains(&target) {
                return Err(DIError::unresolvable(
                    &id,
                    format!("alias target {} is neither registered nor described", target),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct TestProvider {
        name: &'static str,
        priority: u32,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ServiceProvider for TestProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn register(&self, _manager: &ServiceManager) -> DIResult<()> {
            self.log.lock().push(format!("register:{}", self.name));
            Ok(())
        }

        fn boot(&self, _manager: &ServiceManager, _config: &ServiceManagerConfig) -> DIResult<()> {
            self.log.lock().push(format!("boot:{}", self.name));
            Ok(())
        }
    }

    #[test]
    fn test_provider_registry() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ServiceProviderRegistry::new();
        registry.add(TestProvider {
            name: "test1",
            priority: 100,
            log: log.clone(),
        });
        registry.add(TestProvider {
            name: "test2",
            priority: 50,
            log,
        });

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.provider_names(), vec!["test2", "test1"]);
    }

    #[test]
    fn test_priority_ordering_registers_before_boot() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ServiceProviderRegistry::new();
        for (name, priority) in [("low", 200), ("high", 10), ("medium", 100)] {
            registry.add(TestProvider {
                name,
                priority,
                log: log.clone(),
            });
        }

        let manager = ServiceManager::default();
        registry
            .register_all(&manager, &ServiceManagerConfig::default())
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "register:high",
                "register:medium",
                "register:low",
                "boot:high",
                "boot:medium",
                "boot:low",
            ]
        );
    }
}
