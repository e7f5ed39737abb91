use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{
    assignable::Caster,
    catalog::TypeCatalog,
    errors::{DiError, Result},
    instance::Instance,
    key::TypeKey,
    plan::ConstructionPlan,
    provider::{InstanceProvider, Policy},
    validator::validate,
};

/// One entry of the registry: how the requested service is produced.
///
/// The plan always builds the concrete type; when the requested service is
/// a trait object, `caster` turns the concrete instance into that view.
pub struct Registration {
    requested: TypeKey,
    concrete: TypeKey,
    caster: Option<Caster>,
    provider: Box<dyn InstanceProvider>,
}

impl Registration {
    fn new(requested: TypeKey, plan: ConstructionPlan, policy: Policy, caster: Option<Caster>) -> Self {
        Self {
            requested,
            concrete: plan.target(),
            caster,
            provider: policy.provider(plan),
        }
    }

    pub fn requested(&self) -> TypeKey {
        self.requested
    }

    pub fn concrete(&self) -> TypeKey {
        self.concrete
    }

    pub fn policy(&self) -> Policy {
        self.provider.policy()
    }

    pub fn plan(&self) -> &ConstructionPlan {
        self.provider.plan()
    }

    pub fn provider(&self) -> &dyn InstanceProvider {
        self.provider.as_ref()
    }

    /// Instance viewed as the requested service.
    pub fn instance(&self) -> Result<Instance> {
        let instance = self.provider.get_instance()?;
        match &self.caster {
            Some(caster) => caster.cast(instance),
            None => Ok(instance),
        }
    }

    /// Instance viewed as the concrete type.
    pub fn concrete_instance(&self) -> Result<Instance> {
        self.provider.get_instance()
    }

    /// The plan a dependent should embed to obtain `key` from this
    /// registration.
    ///
    /// Transient constructions and constants of the concrete type are
    /// embedded as-is, so the dependent rebuilds the subgraph itself.
    /// Everything else goes through the provider, which keeps singletons
    /// shared and applies the requested view.
    pub fn dependency_plan(self: &Arc<Self>, key: &TypeKey) -> ConstructionPlan {
        let plan = self.plan();
        if *key == self.concrete && (plan.is_constant() || self.policy() == Policy::Transient) {
            return plan.clone();
        }

        let registration = self.clone();
        if *key == self.requested {
            ConstructionPlan::factory_call(*key, move || registration.instance())
        } else {
            ConstructionPlan::factory_call(*key, move || registration.concrete_instance())
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("requested", &self.requested)
            .field("concrete", &self.concrete)
            .field("policy", &self.policy())
            .field("compiled", &self.provider.is_compiled())
            .finish()
    }
}

#[derive(Default)]
struct Table {
    by_requested: HashMap<TypeKey, Arc<Registration>>,
    // first registration per concrete type
    by_concrete: HashMap<TypeKey, Arc<Registration>>,
}

/// Registration table of one container.
///
/// Only [`Registry::register`] mutates the table, and a failed registration
/// leaves it untouched. Locks are never held while plans are validated or
/// instances built.
pub struct Registry {
    catalog: Arc<TypeCatalog>,
    table: RwLock<Table>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(TypeCatalog::new()))
    }

    pub fn with_catalog(catalog: Arc<TypeCatalog>) -> Self {
        Self {
            catalog,
            table: RwLock::new(Table::default()),
        }
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// Register `requested` to be produced by `plan` under `policy`.
    ///
    /// Fails with `DuplicateRegistration` if `requested` already has a
    /// registration, with `NotAssignable` if the plan's type does not
    /// implement `requested`, and with `UnregisteredType` if the plan
    /// constructs a dependency nobody registered.
    pub fn register(&self, requested: TypeKey, plan: ConstructionPlan, policy: Policy) -> Result<()> {
        self.register_with(requested, plan, policy, None)
    }

    /// Like [`Registry::register`], with a caster for the `(requested,
    /// concrete)` pair supplied by the caller instead of taken from the
    /// catalog. The caster is recorded in the catalog only once the
    /// registration is stored.
    pub fn register_with(
        &self,
        requested: TypeKey,
        plan: ConstructionPlan,
        policy: Policy,
        caster: Option<Caster>,
    ) -> Result<()> {
        if self.contains(&requested) {
            warn!("Rejected registration of {}: already registered", requested);
            return Err(DiError::DuplicateRegistration { requested });
        }

        let concrete = plan.target();
        let caster = if requested == concrete {
            None
        } else {
            let supplied = caster.filter(|c| c.requested() == requested && c.concrete() == concrete);
            match supplied.or_else(|| self.catalog.caster(&requested, &concrete)) {
                Some(caster) => Some(caster),
                None => {
                    warn!("Rejected registration of {}: {} does not implement it", requested, concrete);
                    return Err(DiError::NotAssignable {
                        requested,
                        concrete,
                    });
                }
            }
        };

        validate(&plan, self)?;

        let registration = Arc::new(Registration::new(requested, plan, policy, caster.clone()));

        let mut table = self.table.write();
        if table.by_requested.contains_key(&requested) {
            warn!("Rejected registration of {}: registered concurrently", requested);
            return Err(DiError::DuplicateRegistration { requested });
        }
        table
            .by_concrete
            .entry(concrete)
            .or_insert_with(|| registration.clone());
        table.by_requested.insert(requested, registration);
        drop(table);

        if let Some(caster) = caster {
            self.catalog.add_caster(caster);
        }
        debug!("Registered {} -> {} ({:?})", requested, concrete, policy);
        Ok(())
    }

    /// Produce an instance for `key`.
    ///
    /// A requested key yields its registration's view; a key that is only
    /// the concrete type of some registration yields that concrete instance.
    pub fn resolve(&self, key: &TypeKey) -> Result<Instance> {
        let (registration, as_requested) = {
            let table = self.table.read();
            if let Some(registration) = table.by_requested.get(key) {
                (registration.clone(), true)
            } else if let Some(registration) = table.by_concrete.get(key) {
                (registration.clone(), false)
            } else {
                return Err(DiError::UnregisteredType { type_key: *key });
            }
        };

        if as_requested {
            registration.instance()
        } else {
            registration.concrete_instance()
        }
    }

    /// Whether `key` was registered as a requested service.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.table.read().by_requested.contains_key(key)
    }

    /// Whether `key` is a requested service or the concrete type of any
    /// registration.
    pub fn is_registered(&self, key: &TypeKey) -> bool {
        let table = self.table.read();
        table.by_requested.contains_key(key) || table.by_concrete.contains_key(key)
    }

    pub fn registration(&self, key: &TypeKey) -> Option<Arc<Registration>> {
        self.table.read().by_requested.get(key).cloned()
    }

    /// Plan for a dependent that needs `key`, if anything provides it.
    pub fn dependency_plan(&self, key: &TypeKey) -> Option<ConstructionPlan> {
        let registration = {
            let table = self.table.read();
            table
                .by_requested
                .get(key)
                .or_else(|| table.by_concrete.get(key))
                .cloned()
        }?;
        Some(registration.dependency_plan(key))
    }

    pub fn registered_keys(&self) -> Vec<TypeKey> {
        self.table.read().by_requested.keys().copied().collect()
    }

    pub fn registrations(&self) -> Vec<Arc<Registration>> {
        self.table.read().by_requested.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().by_requested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn singleton_count(&self) -> usize {
        self.count_where(|r| r.policy() == Policy::Single)
    }

    pub fn compiled_count(&self) -> usize {
        self.count_where(|r| r.provider().is_compiled())
    }

    fn count_where(&self, predicate: impl Fn(&Registration) -> bool) -> usize {
        self.table
            .read()
            .by_requested
            .values()
            .filter(|r| predicate(r))
            .count()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
