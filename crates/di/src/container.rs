use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::{
    assignable::{Caster, Upcast},
    catalog::{TypeCatalog, TypeInfo},
    config::ContainerConfig,
    errors::{DiError, Result},
    injectable::Injectable,
    instance::Instance,
    key::TypeKey,
    plan::{ConstructionPlan, DependencyLookup, FactoryFn, PlanBuilder, PlanSource, RegistryLookup},
    provider::Policy,
    registry::Registry,
    selector::ConstructorSelector,
};

/// Container statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    pub registrations: usize,
    pub singletons: usize,
    pub compiled_factories: usize,
    pub resolutions: u64,
}

/// Typed front of a [`Registry`].
///
/// Every `register*` call builds a construction plan right away, validates
/// it and stores it; `resolve*` runs the stored plan under the registration's
/// policy. Registrations are permanent for the container's lifetime.
///
/// ```
/// use std::sync::Arc;
/// use di::{implements, Container, ConstructorDescriptor, Injectable};
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
///
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         42
///     }
/// }
///
/// impl Injectable for FixedClock {
///     fn constructors() -> Vec<ConstructorDescriptor> {
///         vec![ConstructorDescriptor::from_fn("new", || FixedClock)]
///     }
/// }
///
/// implements!(dyn Clock => FixedClock);
///
/// let container = Container::new();
/// container.register_single_as::<dyn Clock, FixedClock>().unwrap();
///
/// let clock = container.require::<dyn Clock>().unwrap();
/// assert_eq!(clock.now(), 42);
/// ```
pub struct Container {
    config: ContainerConfig,
    registry: Registry,
    selector: Arc<dyn ConstructorSelector>,
    default_lookup: Arc<dyn DependencyLookup>,
    custom_lookup: RwLock<Option<Arc<dyn DependencyLookup>>>,
    resolutions: AtomicU64,
}

impl Container {
    pub fn new() -> Self {
        Self::build(ContainerConfig::default())
    }

    /// Container configured by `config`. Fails if the configuration is
    /// invalid.
    pub fn with_config(config: ContainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ContainerConfig) -> Self {
        let selector = config.constructor_selection.selector();
        let default_lookup: Arc<dyn DependencyLookup> = Arc::new(RegistryLookup::new(
            selector.clone(),
            config.speculative_lookup,
        ));
        debug!(
            "Created container '{}' ({} selector, speculative lookup {})",
            config.name,
            selector.name(),
            config.speculative_lookup
        );
        Self {
            registry: Registry::new(),
            selector,
            default_lookup,
            custom_lookup: RwLock::new(None),
            resolutions: AtomicU64::new(0),
            config,
        }
    }

    /// Name from the configuration, used in log lines.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration the container was built with.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The underlying registration table.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn catalog(&self) -> &TypeCatalog {
        self.registry.catalog()
    }

    // === Type metadata ===

    /// Make `T`'s constructors known without registering it.
    pub fn describe<T: Injectable>(&self) -> TypeKey {
        self.catalog().describe::<T>()
    }

    /// Allow `C` to be registered for the service `I`.
    pub fn declare<I, C>(&self)
    where
        I: ?Sized + Upcast<C> + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        self.catalog().declare::<I, C>();
    }

    // === Dependency lookup hook ===

    /// The hook currently used to turn constructor parameters into plans.
    pub fn lookup(&self) -> Arc<dyn DependencyLookup> {
        self.custom_lookup
            .read()
            .clone()
            .unwrap_or_else(|| self.default_lookup.clone())
    }

    /// Replace the dependency lookup hook. Affects registrations made
    /// afterwards; existing plans are kept.
    pub fn set_lookup<L>(&self, lookup: L)
    where
        L: DependencyLookup + 'static,
    {
        let lookup: Arc<dyn DependencyLookup> = Arc::new(lookup);
        *self.custom_lookup.write() = Some(lookup);
        debug!("Container '{}': dependency lookup replaced", self.config.name);
    }

    /// Go back to looking dependencies up in this container's registry.
    pub fn reset_lookup(&self) {
        *self.custom_lookup.write() = None;
        debug!("Container '{}': dependency lookup reset", self.config.name);
    }

    // === Registration ===

    /// Register `T` as itself, built through its constructor on every
    /// resolve.
    pub fn register<T: Injectable>(&self) -> Result<()> {
        self.register_constructed::<T>(TypeKey::of::<T>(), Policy::Transient, None)
    }

    /// Register `C` for the service `I`, built on every resolve.
    pub fn register_as<I, C>(&self) -> Result<()>
    where
        I: ?Sized + Upcast<C> + Send + Sync + 'static,
        C: Injectable,
    {
        self.register_constructed::<C>(TypeKey::of::<I>(), Policy::Transient, Some(Caster::of::<I, C>()))
    }

    /// Register `T` as itself, produced by calling `factory` on every
    /// resolve.
    pub fn register_factory<T, F>(&self, factory: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register_source(TypeKey::of::<T>(), wrap_factory(factory), Policy::Transient, None)
    }

    /// Register `factory`'s output for the service `I`.
    pub fn register_factory_as<I, C, F>(&self, factory: F) -> Result<()>
    where
        I: ?Sized + Upcast<C> + Send + Sync + 'static,
        C: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<C> + Send + Sync + 'static,
    {
        self.register_source(
            TypeKey::of::<I>(),
            wrap_factory(factory),
            Policy::Transient,
            Some(Caster::of::<I, C>()),
        )
    }

    /// Register `T` as itself, built once on first resolve.
    pub fn register_single<T: Injectable>(&self) -> Result<()> {
        self.register_constructed::<T>(TypeKey::of::<T>(), Policy::Single, None)
    }

    /// Register `C` for the service `I`, built once on first resolve.
    pub fn register_single_as<I, C>(&self) -> Result<()>
    where
        I: ?Sized + Upcast<C> + Send + Sync + 'static,
        C: Injectable,
    {
        self.register_constructed::<C>(TypeKey::of::<I>(), Policy::Single, Some(Caster::of::<I, C>()))
    }

    /// Register an existing instance, or the explicit empty value with
    /// `None`.
    pub fn register_single_instance<T>(&self, instance: impl Into<Option<Arc<T>>>) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = Instance::from_option(instance.into());
        self.register_source(TypeKey::of::<T>(), PlanSource::Instance(instance), Policy::Single, None)
    }

    /// Register by keys alone. `concrete` must have been described with
    /// [`Container::describe`], and declared for `requested` if they differ.
    pub fn register_type(&self, requested: TypeKey, concrete: TypeKey, policy: Policy) -> Result<()> {
        self.ensure_unregistered(requested)?;
        let info = self
            .catalog()
            .info(&concrete)
            .ok_or(DiError::TypeNotConstructable {
                type_key: concrete,
                reason: "type is not described",
            })?;
        self.register_source(requested, PlanSource::Constructed(info), policy, None)
    }

    /// Register a plan built elsewhere.
    pub fn register_plan(&self, requested: TypeKey, plan: ConstructionPlan, policy: Policy) -> Result<()> {
        self.registry.register(requested, plan, policy)
    }

    /// Build the plan `key` would be registered with, without registering it.
    pub fn build_plan(&self, key: &TypeKey) -> Result<ConstructionPlan> {
        let info = self
            .catalog()
            .info(key)
            .ok_or(DiError::TypeNotConstructable {
                type_key: *key,
                reason: "type is not described",
            })?;
        self.plan(PlanSource::Constructed(info))
    }

    // `C` is described only once the registration is stored.
    fn register_constructed<C: Injectable>(
        &self,
        requested: TypeKey,
        policy: Policy,
        caster: Option<Caster>,
    ) -> Result<()> {
        self.ensure_unregistered(requested)?;
        let info = TypeInfo::of::<C>();
        self.register_source(requested, PlanSource::Constructed(info.clone()), policy, caster)?;
        self.catalog().insert(info);
        Ok(())
    }

    fn register_source(
        &self,
        requested: TypeKey,
        source: PlanSource,
        policy: Policy,
        caster: Option<Caster>,
    ) -> Result<()> {
        self.ensure_unregistered(requested)?;
        let plan = self.plan(source).map_err(|e| {
            warn!("Rejected registration of {}: {}", requested, e);
            e
        })?;
        self.registry.register_with(requested, plan, policy, caster)
    }

    fn ensure_unregistered(&self, requested: TypeKey) -> Result<()> {
        if self.registry.contains(&requested) {
            warn!("Rejected registration of {}: already registered", requested);
            return Err(DiError::DuplicateRegistration { requested });
        }
        Ok(())
    }

    fn plan(&self, source: PlanSource) -> Result<ConstructionPlan> {
        let lookup = self.lookup();
        PlanBuilder::new(self.selector.as_ref(), lookup.as_ref(), &self.registry).build(source)
    }

    // === Resolution ===

    /// Resolve `T`. `Ok(None)` when `T` was registered as the empty value.
    pub fn resolve<T>(&self) -> Result<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_key(&TypeKey::of::<T>())?.downcast::<T>()
    }

    /// Resolve `T`, treating the empty value as an error.
    pub fn require<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_key(&TypeKey::of::<T>())?.require::<T>()
    }

    /// Resolve `T`, logging and discarding any error.
    pub fn try_resolve<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.resolve::<T>() {
            Ok(instance) => instance,
            Err(e) => {
                debug!("Failed to resolve {}: {}", TypeKey::of::<T>(), e);
                None
            }
        }
    }

    /// Untyped resolve. The instance is the empty value for an explicitly
    /// registered `None`; use [`Instance::downcast`] to get at the value.
    pub fn resolve_key(&self, key: &TypeKey) -> Result<Instance> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if self.config.trace_resolutions {
            debug!("Container '{}': resolving {}", self.config.name, key);
        } else {
            trace!("Container '{}': resolving {}", self.config.name, key);
        }
        self.registry.resolve(key)
    }

    /// Typed form of [`Container::is_registered_key`].
    pub fn is_registered<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.is_registered_key(&TypeKey::of::<T>())
    }

    /// Whether `key` is a registered service or the concrete type behind one.
    pub fn is_registered_key(&self, key: &TypeKey) -> bool {
        self.registry.is_registered(key)
    }

    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            registrations: self.registry.len(),
            singletons: self.registry.singleton_count(),
            compiled_factories: self.registry.compiled_count(),
            resolutions: self.resolutions.load(Ordering::Relaxed),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap_factory<T, F>(factory: F) -> PlanSource
where
    T: Send + Sync + 'static,
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
{
    let factory: FactoryFn = Arc::new(move || {
        let value = factory().map_err(DiError::Factory)?;
        Ok(Instance::new(Arc::new(value)))
    });
    PlanSource::Factory {
        target: TypeKey::of::<T>(),
        factory,
    }
}
