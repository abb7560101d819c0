//! Auto-discovery of class descriptors using the inventory crate
//!
//! Any crate linked into the binary can describe its classes with
//! `inventory::submit!`; they are collected at runtime into a
//! [`ClassCatalog`].
//!
//! ## Usage
//!
//! In a feature crate:
//!
//! ```rust,ignore
//! use ricecoder_service_manager::{ClassDescriptor, ClassRegistration, ParameterDescriptor};
//!
//! inventory::submit! {
//!     ClassRegistration::new("Mailer", || {
//!         ClassDescriptor::new("Mailer", |args| Ok(Mailer::new(args.get::<Transport>(0)?)))
//!             .with_constructor(vec![ParameterDescriptor::class("transport", "Transport")])
//!     })
//! }
//! ```
//!
//! At startup:
//!
//! ```rust,ignore
//! let manager = ServiceManager::builder().with_discovered_classes().build()?;
//! ```

use tracing::{debug, info};

use crate::{ClassCatalog, ClassDescriptor};

/// A class description that can be collected via inventory
pub struct ClassRegistration {
    /// Class name, used for diagnostics
    pub name: &'static str,

    /// Produces the descriptor when a catalog is assembled
    pub describe: fn() -> ClassDescriptor,
}

impl ClassRegistration {
    pub const fn new(name: &'static str, describe: fn() -> ClassDescriptor) -> Self {
        Self { name, describe }
    }
}

inventory::collect!(ClassRegistration);

impl ClassCatalog {
    /// Catalog of every class submitted through `inventory::submit!`
    pub fn discovered() -> Self {
        let catalog = ClassCatalog::new();
        for registration in inventory::iter::<ClassRegistration> {
            debug!("Describing discovered class '{}'", registration.name);
            catalog.register((registration.describe)());
        }

        info!("Discovered {} class descriptions via inventory", catalog.len());
        catalog
    }
}

/// Number of submitted class registrations
pub fn discovered_class_count() -> usize {
    inventory::iter::<ClassRegistration>.into_iter().count()
}

/// Names of all submitted class registrations
pub fn list_discovered_classes() -> Vec<&'static str> {
    inventory::iter::<ClassRegistration>
        .into_iter()
        .map(|r| r.name)
        .collect()
}
