//! Shared fixtures for integration tests.
//!
//! Service graph:
//! - `A` has no dependencies and implements `IA`;
//! - `C(a: A)`, `D(c: C)`, `E(a: A)`;
//! - `F(ia: IA)` depends on the trait object;
//! - `G(c: C)` offers a second, parameterless constructor;
//! - `WrappedA(a: A)` is a second implementation of `IA`.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use di::{implements, ConstructorDescriptor, Injectable};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub trait IA: Send + Sync {
    fn label(&self) -> &'static str;
}

pub struct A;

impl IA for A {
    fn label(&self) -> &'static str {
        "a"
    }
}

implements!(dyn IA => A);

impl Injectable for A {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", || A)]
    }
}

pub struct C {
    pub a: Arc<A>,
}

impl Injectable for C {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", |a: Arc<A>| C { a })]
    }
}

pub struct D {
    pub c: Arc<C>,
}

impl Injectable for D {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", |c: Arc<C>| D { c })]
    }
}

pub struct E {
    pub a: Arc<A>,
}

impl Injectable for E {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", |a: Arc<A>| E { a })]
    }
}

pub struct F {
    pub ia: Arc<dyn IA>,
}

impl Injectable for F {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", |ia: Arc<dyn IA>| F { ia })]
    }
}

pub struct G {
    pub c: Option<Arc<C>>,
}

impl Injectable for G {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![
            ConstructorDescriptor::from_fn("empty", || G { c: None }),
            ConstructorDescriptor::from_fn("new", |c: Arc<C>| G { c: Some(c) }),
        ]
    }
}

pub struct WrappedA {
    pub a: Arc<A>,
}

impl IA for WrappedA {
    fn label(&self) -> &'static str {
        "wrapped"
    }
}

implements!(dyn IA => WrappedA);

impl Injectable for WrappedA {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", |a: Arc<A>| WrappedA { a })]
    }
}

/// Declares only a private constructor.
pub struct Sealed;

impl Injectable for Sealed {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", || Sealed).private()]
    }
}

/// Accepts the explicit empty value for its dependency.
pub struct Lenient {
    pub a: Option<Arc<A>>,
}

impl Injectable for Lenient {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![ConstructorDescriptor::from_fn("new", |a: Option<Arc<A>>| Lenient { a })]
    }
}
