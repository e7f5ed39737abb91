//! Registration-time invariants: duplicates, assignability, constructability
//! and dependency validation.

mod common;

use std::sync::Arc;

use common::*;
use di::{Container, ContainerConfig, DiError, Policy, TypeKey};

#[test]
fn test_duplicate_registration_any_policy() {
    init_tracing();
    let container = Container::new();
    container.register::<A>().unwrap();

    let attempts = [
        container.register::<A>(),
        container.register_single::<A>(),
        container.register_single_instance::<A>(Arc::new(A)),
        container.register_factory::<A, _>(|| Ok(A)),
    ];
    for attempt in attempts {
        assert!(matches!(
            attempt,
            Err(DiError::DuplicateRegistration { requested }) if requested == TypeKey::of::<A>()
        ));
    }
    assert_eq!(container.stats().registrations, 1);
}

#[test]
fn test_duplicate_interface_with_other_concrete() {
    init_tracing();
    let container = Container::new();
    container.register_as::<dyn IA, A>().unwrap();

    struct OtherA;
    impl IA for OtherA {
        fn label(&self) -> &'static str {
            "other"
        }
    }
    di::implements!(dyn IA => OtherA);

    let error = container
        .register_factory_as::<dyn IA, OtherA, _>(|| Ok(OtherA))
        .unwrap_err();
    assert!(matches!(error, DiError::DuplicateRegistration { .. }));
    assert_eq!(container.require::<dyn IA>().unwrap().label(), "a");
}

#[test]
fn test_unresolved_dependency_leaves_type_unregistered() {
    init_tracing();
    let container = Container::new();

    let error = container.register::<C>().unwrap_err();
    assert!(matches!(
        error,
        DiError::DependencyUnresolved { dependency, dependent }
            if dependency == TypeKey::of::<A>() && dependent == TypeKey::of::<C>()
    ));
    assert!(error.is_registration_error());
    assert!(!container.is_registered::<C>());

    // the failed attempt did not consume the slot
    container.register::<A>().unwrap();
    container.register::<C>().unwrap();
    assert!(container.is_registered::<C>());
}

#[test]
fn test_failed_registration_leaves_catalog_untouched() {
    init_tracing();
    let fresh = Container::new();
    fresh.register::<A>().unwrap();
    let expected = fresh.register::<D>().unwrap_err();

    let container = Container::new();
    assert!(container.register::<C>().is_err());
    assert!(!container.catalog().is_described(&TypeKey::of::<C>()));
    container.register::<A>().unwrap();
    let error = container.register::<D>().unwrap_err();

    assert_eq!(std::mem::discriminant(&error), std::mem::discriminant(&expected));
    assert!(matches!(
        error,
        DiError::DependencyUnresolved { dependency, .. } if dependency == TypeKey::of::<C>()
    ));
}

#[test]
fn test_failed_interface_registration_declares_nothing() {
    init_tracing();
    let container = Container::new();
    let ia = TypeKey::of::<dyn IA>();
    let wrapped = TypeKey::of::<WrappedA>();

    let error = container.register_as::<dyn IA, WrappedA>().unwrap_err();
    assert!(matches!(error, DiError::DependencyUnresolved { .. }));
    assert!(!container.catalog().is_assignable(&ia, &wrapped));
    assert!(!container.catalog().is_described(&wrapped));

    container.register::<A>().unwrap();
    container.register_single_as::<dyn IA, WrappedA>().unwrap();
    assert!(container.catalog().is_assignable(&ia, &wrapped));
    assert!(container.catalog().is_described(&wrapped));
    assert_eq!(container.require::<dyn IA>().unwrap().label(), "wrapped");
}

#[test]
fn test_described_but_unregistered_dependency_is_named() {
    init_tracing();
    let container = Container::new();
    container.register::<A>().unwrap();
    container.describe::<C>();

    let error = container.register::<D>().unwrap_err();
    assert!(matches!(
        error,
        DiError::UnregisteredType { type_key } if type_key == TypeKey::of::<C>()
    ));
    assert!(!container.is_registered::<D>());
    assert!(!container.is_registered::<C>());
}

#[test]
fn test_speculation_can_be_disabled() {
    init_tracing();
    let config = ContainerConfig {
        speculative_lookup: false,
        ..ContainerConfig::named("strict")
    };
    let container = Container::with_config(config).unwrap();
    container.register::<A>().unwrap();
    container.describe::<C>();

    let error = container.register::<D>().unwrap_err();
    assert!(matches!(
        error,
        DiError::DependencyUnresolved { dependency, .. } if dependency == TypeKey::of::<C>()
    ));
}

#[test]
fn test_no_public_constructor() {
    init_tracing();
    let container = Container::new();
    let error = container.register::<Sealed>().unwrap_err();
    assert!(matches!(
        error,
        DiError::TypeNotConstructable { type_key, .. } if type_key == TypeKey::of::<Sealed>()
    ));
    assert!(!container.is_registered::<Sealed>());
}

#[test]
fn test_runtime_keyed_registration_checks_assignability() {
    init_tracing();
    let container = Container::new();
    container.describe::<A>();
    container.describe::<C>();

    container.register::<A>().unwrap();

    let error = container
        .register_type(TypeKey::of::<dyn IA>(), TypeKey::of::<C>(), Policy::Single)
        .unwrap_err();
    assert!(matches!(
        error,
        DiError::NotAssignable { requested, concrete }
            if requested == TypeKey::of::<dyn IA>() && concrete == TypeKey::of::<C>()
    ));

    container.declare::<dyn IA, A>();
    container
        .register_type(TypeKey::of::<dyn IA>(), TypeKey::of::<A>(), Policy::Single)
        .unwrap();
    assert_eq!(container.require::<dyn IA>().unwrap().label(), "a");
}

#[test]
fn test_concrete_type_counts_as_registered() {
    init_tracing();
    let container = Container::new();
    container.register_single_as::<dyn IA, A>().unwrap();

    assert!(container.is_registered::<dyn IA>());
    assert!(container.is_registered::<A>());

    // a dependent of the concrete type validates and shares the singleton
    container.register::<C>().unwrap();
    let c = container.require::<C>().unwrap();
    let ia = container.require::<dyn IA>().unwrap();
    assert_eq!(
        Arc::as_ptr(&c.a) as *const (),
        Arc::as_ptr(&ia) as *const ()
    );
}
