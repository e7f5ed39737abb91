use std::sync::Arc;

use tracing::trace;

use super::{ConstructionPlan, PlanBuilder};
use crate::{key::TypeKey, registry::Registry, selector::ConstructorSelector};

/// Maps a constructor parameter type to the plan that produces it.
///
/// This is the one customization point of dependency resolution: wrap
/// [`RegistryLookup`] to observe or augment lookups, or replace it to pull
/// plans from another source. Closures of the right shape implement it too.
pub trait DependencyLookup: Send + Sync {
    fn lookup(&self, dependency: &TypeKey, registry: &Registry) -> Option<ConstructionPlan>;
}

impl<F> DependencyLookup for F
where
    F: Fn(&TypeKey, &Registry) -> Option<ConstructionPlan> + Send + Sync,
{
    fn lookup(&self, dependency: &TypeKey, registry: &Registry) -> Option<ConstructionPlan> {
        self(dependency, registry)
    }
}

/// Default lookup: answer from the registry's own registrations.
///
/// With `speculative` set, a type that is not registered but whose
/// constructors are described in the catalog gets a one-level plan of its
/// own. Its dependencies must be registered; the plan is later rejected by
/// validation, which reports the unregistered type by name instead of a bare
/// "unresolved dependency".
#[derive(Clone)]
pub struct RegistryLookup {
    selector: Arc<dyn ConstructorSelector>,
    speculative: bool,
}

impl RegistryLookup {
    pub fn new(selector: Arc<dyn ConstructorSelector>, speculative: bool) -> Self {
        Self {
            selector,
            speculative,
        }
    }

    pub fn is_speculative(&self) -> bool {
        self.speculative
    }
}

impl DependencyLookup for RegistryLookup {
    fn lookup(&self, dependency: &TypeKey, registry: &Registry) -> Option<ConstructionPlan> {
        if let Some(plan) = registry.dependency_plan(dependency) {
            return Some(plan);
        }
        if !self.speculative {
            return None;
        }

        let info = registry.catalog().info(dependency)?;
        let strict = RegistryLookup::new(self.selector.clone(), false);
        let plan = PlanBuilder::new(self.selector.as_ref(), &strict, registry)
            .build_constructed(&info)
            .ok();
        trace!(
            "Speculative plan for unregistered {}: {}",
            dependency,
            if plan.is_some() { "built" } else { "unavailable" }
        );
        plan
    }
}
