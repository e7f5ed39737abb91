//! Type metadata kept next to the registry.
//!
//! A type must be described (its constructors known) before the default
//! lookup can build a plan for it, and a trait-object service must have a
//! declared caster before a concrete type can be registered for it.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    assignable::{Caster, Upcast},
    injectable::{ConstructorDescriptor, Injectable},
    key::TypeKey,
};

/// Constructor metadata of one type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    key: TypeKey,
    constructors: Vec<ConstructorDescriptor>,
}

impl TypeInfo {
    pub fn of<T: Injectable>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            constructors: T::constructors(),
        }
    }

    pub fn new(key: TypeKey, constructors: Vec<ConstructorDescriptor>) -> Self {
        Self { key, constructors }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn public_constructors(&self) -> impl Iterator<Item = &ConstructorDescriptor> {
        self.constructors.iter().filter(|c| c.is_public())
    }
}

/// What the container knows about types: which ones can be constructed and
/// which concrete types implement which requested services.
#[derive(Default)]
pub struct TypeCatalog {
    types: RwLock<HashMap<TypeKey, TypeInfo>>,
    casts: RwLock<HashMap<(TypeKey, TypeKey), Caster>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `insert(TypeInfo::of::<T>())`.
    pub fn describe<T: Injectable>(&self) -> TypeKey {
        self.insert(TypeInfo::of::<T>())
    }

    /// Record `info` unless its type is already described. The first
    /// description of a type is kept.
    pub fn insert(&self, info: TypeInfo) -> TypeKey {
        let key = info.key();
        let mut types = self.types.write();
        if !types.contains_key(&key) {
            debug!(
                "Described {} with {} constructor(s)",
                key,
                info.constructors().len()
            );
            types.insert(key, info);
        }
        key
    }

    /// Constructors of `key`, if described.
    pub fn info(&self, key: &TypeKey) -> Option<TypeInfo> {
        self.types.read().get(key).cloned()
    }

    pub fn is_described(&self, key: &TypeKey) -> bool {
        self.types.read().contains_key(key)
    }

    /// Record that `C` can be used wherever `I` is requested.
    pub fn declare<I, C>(&self)
    where
        I: ?Sized + Upcast<C> + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        self.add_caster(Caster::of::<I, C>());
    }

    pub fn add_caster(&self, caster: Caster) {
        let pair = (caster.requested(), caster.concrete());
        self.casts.write().entry(pair).or_insert(caster);
    }

    pub fn caster(&self, requested: &TypeKey, concrete: &TypeKey) -> Option<Caster> {
        self.casts.read().get(&(*requested, *concrete)).cloned()
    }

    /// `concrete` satisfies `requested` if it is the same type or a declared
    /// implementation of it.
    pub fn is_assignable(&self, requested: &TypeKey, concrete: &TypeKey) -> bool {
        requested == concrete || self.casts.read().contains_key(&(*requested, *concrete))
    }

    pub fn described_count(&self) -> usize {
        self.types.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Store: Send + Sync {}

    struct Disk;
    impl Store for Disk {}
    crate::implements!(dyn Store => Disk);

    impl Injectable for Disk {
        fn constructors() -> Vec<ConstructorDescriptor> {
            vec![
                ConstructorDescriptor::from_fn("new", || Disk),
                ConstructorDescriptor::from_fn("with_parent", |_parent: Arc<Disk>| Disk).private(),
            ]
        }
    }

    #[test]
    fn test_describe_once() {
        let catalog = TypeCatalog::new();
        assert!(!catalog.is_described(&TypeKey::of::<Disk>()));

        catalog.describe::<Disk>();
        catalog.describe::<Disk>();

        let info = catalog.info(&TypeKey::of::<Disk>()).unwrap();
        assert_eq!(catalog.described_count(), 1);
        assert_eq!(info.constructors().len(), 2);
        assert_eq!(info.public_constructors().count(), 1);
    }

    #[test]
    fn test_assignability() {
        let catalog = TypeCatalog::new();
        let store = TypeKey::of::<dyn Store>();
        let disk = TypeKey::of::<Disk>();

        assert!(catalog.is_assignable(&disk, &disk));
        assert!(!catalog.is_assignable(&store, &disk));

        catalog.declare::<dyn Store, Disk>();
        assert!(catalog.is_assignable(&store, &disk));
        assert!(!catalog.is_assignable(&disk, &store));
        assert!(catalog.caster(&store, &disk).is_some());
    }
}
