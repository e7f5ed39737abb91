//! Instantiation policies.
//!
//! A provider owns a registration's plan and decides how often it runs:
//!
//! - [`TransientProvider`] compiles the plan on first use and runs it on
//!   every request;
//! - [`SingleProvider`] compiles and runs it exactly once, then hands out the
//!   cached instance.
//!
//! Both memoize through `once_cell::sync::OnceCell`, so concurrent first
//! calls run the initializer once and every caller observes the same result.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::Result,
    instance::Instance,
    plan::{CompiledFactory, ConstructionPlan},
};

/// Lifetime of instances produced by a registration
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// New instance on every resolve
    #[default]
    Transient,
    /// One cached instance per registration
    Single,
}

impl Policy {
    pub fn provider(self, plan: ConstructionPlan) -> Box<dyn InstanceProvider> {
        match self {
            Policy::Transient => Box::new(TransientProvider::new(plan)),
            Policy::Single => Box::new(SingleProvider::new(plan)),
        }
    }
}

pub trait InstanceProvider: Send + Sync {
    fn policy(&self) -> Policy;

    fn plan(&self) -> &ConstructionPlan;

    /// The compiled plan, built on first call.
    fn factory(&self) -> CompiledFactory;

    fn get_instance(&self) -> Result<Instance>;

    fn is_compiled(&self) -> bool;

    /// Whether a cached instance exists.
    fn is_materialized(&self) -> bool {
        false
    }
}

pub struct TransientProvider {
    plan: ConstructionPlan,
    factory: OnceCell<CompiledFactory>,
}

impl TransientProvider {
    pub fn new(plan: ConstructionPlan) -> Self {
        Self {
            plan,
            factory: OnceCell::new(),
        }
    }
}

impl InstanceProvider for TransientProvider {
    fn policy(&self) -> Policy {
        Policy::Transient
    }

    fn plan(&self) -> &ConstructionPlan {
        &self.plan
    }

    fn factory(&self) -> CompiledFactory {
        self.factory
            .get_or_init(|| {
                debug!("Compiling transient plan for {}", self.plan.target());
                self.plan.compile()
            })
            .clone()
    }

    fn get_instance(&self) -> Result<Instance> {
        (self.factory())()
    }

    fn is_compiled(&self) -> bool {
        self.factory.get().is_some()
    }
}

pub struct SingleProvider {
    plan: ConstructionPlan,
    factory: OnceCell<CompiledFactory>,
    instance: OnceCell<Instance>,
}

impl SingleProvider {
    pub fn new(plan: ConstructionPlan) -> Self {
        Self {
            plan,
            factory: OnceCell::new(),
            instance: OnceCell::new(),
        }
    }
}

impl InstanceProvider for SingleProvider {
    fn policy(&self) -> Policy {
        Policy::Single
    }

    fn plan(&self) -> &ConstructionPlan {
        &self.plan
    }

    fn factory(&self) -> CompiledFactory {
        self.factory
            .get_or_init(|| {
                debug!("Compiling single plan for {}", self.plan.target());
                self.plan.compile()
            })
            .clone()
    }

    fn get_instance(&self) -> Result<Instance> {
        // A failed initializer leaves the cell empty; the next call retries.
        self.instance
            .get_or_try_init(|| {
                let instance = (self.factory())()?;
                debug!("Created single instance of {}", self.plan.target());
                Ok(instance)
            })
            .cloned()
    }

    fn is_compiled(&self) -> bool {
        self.factory.get().is_some()
    }

    fn is_materialized(&self) -> bool {
        self.instance.get().is_some()
    }
}
