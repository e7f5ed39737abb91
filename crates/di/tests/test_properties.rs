//! Property tests over sequences of registrations.

mod common;

use std::sync::Arc;

use common::*;
use di::{Container, DiError, Policy, TypeKey};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Form {
    Constructed(Policy),
    Factory,
    Instance,
    Empty,
}

fn form() -> impl Strategy<Value = Form> {
    prop_oneof![
        Just(Form::Constructed(Policy::Transient)),
        Just(Form::Constructed(Policy::Single)),
        Just(Form::Factory),
        Just(Form::Instance),
        Just(Form::Empty),
    ]
}

fn register_a(container: &Container, form: Form) -> di::Result<()> {
    match form {
        Form::Constructed(policy) => {
            container.describe::<A>();
            container.register_type(TypeKey::of::<A>(), TypeKey::of::<A>(), policy)
        }
        Form::Factory => container.register_factory::<A, _>(|| Ok(A)),
        Form::Instance => container.register_single_instance::<A>(Arc::new(A)),
        Form::Empty => container.register_single_instance::<A>(None::<Arc<A>>),
    }
}

proptest! {
    #[test]
    fn test_only_first_registration_wins(forms in proptest::collection::vec(form(), 1..8)) {
        let container = Container::new();

        prop_assert!(register_a(&container, forms[0]).is_ok());
        for form in &forms[1..] {
            let result = register_a(&container, *form);
            let is_duplicate = matches!(result, Err(DiError::DuplicateRegistration { .. }));
            prop_assert!(is_duplicate);
        }

        prop_assert_eq!(container.stats().registrations, 1);
        let empty = matches!(forms[0], Form::Empty);
        prop_assert_eq!(container.resolve::<A>().unwrap().is_none(), empty);
    }

    #[test]
    fn test_transient_resolves_are_distinct(count in 2usize..16) {
        let container = Container::new();
        container.register::<A>().unwrap();
        container.register::<C>().unwrap();

        let resolved: Vec<Arc<C>> = (0..count).map(|_| container.require::<C>().unwrap()).collect();
        for (i, left) in resolved.iter().enumerate() {
            for right in &resolved[i + 1..] {
                prop_assert!(!Arc::ptr_eq(left, right));
                prop_assert!(!Arc::ptr_eq(&left.a, &right.a));
            }
        }
    }
}
