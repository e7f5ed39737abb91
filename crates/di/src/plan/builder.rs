use tracing::debug;

use super::{ConstructionPlan, DependencyLookup, FactoryFn};
use crate::{
    catalog::TypeInfo,
    errors::{DiError, Result},
    instance::Instance,
    key::TypeKey,
    registry::Registry,
    selector::ConstructorSelector,
};

/// What a registration asks the builder to produce.
pub enum PlanSource {
    /// Build through the type's selected constructor.
    Constructed(TypeInfo),
    /// Hand out this instance.
    Instance(Instance),
    /// Call this factory.
    Factory { target: TypeKey, factory: FactoryFn },
}

impl PlanSource {
    pub fn target(&self) -> TypeKey {
        match self {
            Self::Constructed(info) => info.key(),
            Self::Instance(instance) => instance.key(),
            Self::Factory { target, .. } => *target,
        }
    }
}

/// Turns a [`PlanSource`] into a [`ConstructionPlan`], resolving constructor
/// parameters through the dependency lookup hook.
pub struct PlanBuilder<'a> {
    selector: &'a dyn ConstructorSelector,
    lookup: &'a dyn DependencyLookup,
    registry: &'a Registry,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(
        selector: &'a dyn ConstructorSelector,
        lookup: &'a dyn DependencyLookup,
        registry: &'a Registry,
    ) -> Self {
        Self {
            selector,
            lookup,
            registry,
        }
    }

    pub fn build(&self, source: PlanSource) -> Result<ConstructionPlan> {
        match source {
            PlanSource::Instance(instance) => Ok(ConstructionPlan::constant(instance)),
            PlanSource::Factory { target, factory } => {
                Ok(ConstructionPlan::from_factory(target, factory))
            }
            PlanSource::Constructed(info) => self.build_constructed(&info),
        }
    }

    pub fn build_constructed(&self, info: &TypeInfo) -> Result<ConstructionPlan> {
        let constructor =
            self.selector
                .select(info)
                .ok_or_else(|| DiError::TypeNotConstructable {
                    type_key: info.key(),
                    reason: "no public constructor",
                })?;

        let mut children = Vec::with_capacity(constructor.arity());
        for parameter in constructor.parameters() {
            let child = self
                .lookup
                .lookup(parameter, self.registry)
                .ok_or(DiError::DependencyUnresolved {
                    dependency: *parameter,
                    dependent: info.key(),
                })?;
            children.push(child);
        }

        debug!(
            "Built plan for {} using constructor '{}' ({} dependencies, {} selector)",
            info.key(),
            constructor.name(),
            children.len(),
            self.selector.name()
        );
        Ok(ConstructionPlan::constructor(constructor, children))
    }
}
