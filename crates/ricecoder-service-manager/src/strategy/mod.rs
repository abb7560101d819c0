//! Resolution strategies
//!
//! A strategy turns an identifier into an instance. The service manager owns
//! exactly one strategy, fixed at construction. Strategies recurse through
//! [`ServiceManager::resolve`] so nested lookups go through the same
//! pipeline, cycle detection included.

mod auto_wiring;
mod manual;

pub use auto_wiring::AutoWiringStrategy;
pub use manual::ManualStrategy;

use serde::{Deserialize, Serialize};

use crate::{DIResult, Instance, ServiceManager};

/// Turns identifiers into instances
pub trait ResolverStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Resolve `id`, calling back into `manager` for nested dependencies
    fn resolve(&self, id: &str, manager: &ServiceManager) -> DIResult<Instance>;
}

/// Built-in strategy selection, as read from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    AutoWiring,
    Manual,
}

impl StrategyKind {
    pub fn build(&self) -> Box<dyn ResolverStrategy> {
        match self {
            StrategyKind::AutoWiring => Box::new(AutoWiringStrategy),
            StrategyKind::Manual => Box::new(ManualStrategy),
        }
    }
}
