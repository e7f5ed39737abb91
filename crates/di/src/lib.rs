//! Dependency-injection container built on construction plans.
//!
//! Registering a type builds, once, a graph describing how to create it:
//! the selected constructor, with one child plan per parameter. The graph is
//! validated at registration time, so a container that accepted a
//! registration can always produce it. Resolving runs the graph either on
//! every request (transient) or once (single).
//!
//! ```
//! use std::sync::Arc;
//! use di::{Container, ConstructorDescriptor, Injectable};
//!
//! struct Database;
//!
//! impl Injectable for Database {
//!     fn constructors() -> Vec<ConstructorDescriptor> {
//!         vec![ConstructorDescriptor::from_fn("new", || Database)]
//!     }
//! }
//!
//! struct Repository {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for Repository {
//!     fn constructors() -> Vec<ConstructorDescriptor> {
//!         vec![ConstructorDescriptor::from_fn("new", |db: Arc<Database>| Repository { db })]
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_single::<Database>().unwrap();
//! container.register::<Repository>().unwrap();
//!
//! let first = container.require::<Repository>().unwrap();
//! let second = container.require::<Repository>().unwrap();
//! assert!(!Arc::ptr_eq(&first, &second));
//! assert!(Arc::ptr_eq(&first.db, &second.db));
//! ```

pub mod adapter;
pub mod assignable;
pub mod catalog;
pub mod config;
pub mod container;
pub mod errors;
pub mod injectable;
pub mod instance;
pub mod key;
pub mod plan;
pub mod provider;
pub mod registry;
pub mod selector;
pub mod validator;

pub use adapter::{ServiceProvider, ServiceProviderExt};
pub use assignable::{Caster, Upcast};
pub use catalog::{TypeCatalog, TypeInfo};
pub use config::ContainerConfig;
pub use container::{Container, ContainerStats};
pub use errors::{DiError, Result};
pub use injectable::{Arguments, ConstructorDescriptor, ConstructorFn, FromArgument, Injectable, Visibility};
pub use instance::Instance;
pub use key::TypeKey;
pub use plan::{
    CompiledFactory, ConstructionPlan, DependencyLookup, FactoryFn, PlanBuilder, PlanNode,
    PlanSource, RegistryLookup,
};
pub use provider::{InstanceProvider, Policy, SingleProvider, TransientProvider};
pub use registry::{Registration, Registry};
pub use selector::{ConstructorSelector, LeastSpecific, MostSpecific, SelectionStrategy};
pub use validator::validate;
