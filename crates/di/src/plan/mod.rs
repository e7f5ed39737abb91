//! Construction plans.
//!
//! A plan is an `Arc`-shared DAG describing how to produce one instance:
//!
//! - `Constructor` calls a selected constructor with the instances produced
//!   by its children, one child per parameter;
//! - `Constant` hands out a captured instance (possibly the empty value);
//! - `FactoryCall` invokes a zero-argument callable.
//!
//! Plans are built once per registration by [`PlanBuilder`] and turned into a
//! closure tree by [`ConstructionPlan::compile`]; instantiation policies
//! decide how often that closure runs.

mod builder;
mod lookup;

pub use builder::{PlanBuilder, PlanSource};
pub use lookup::{DependencyLookup, RegistryLookup};

use std::{fmt, sync::Arc};

use tracing::trace;

use crate::{
    errors::Result,
    injectable::ConstructorDescriptor,
    instance::Instance,
    key::TypeKey,
};

/// Zero-argument instance producer.
pub type FactoryFn = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;

/// A plan compiled into a callable.
pub type CompiledFactory = FactoryFn;

pub enum PlanNode {
    Constructor {
        constructor: ConstructorDescriptor,
        children: Vec<ConstructionPlan>,
    },
    Constant {
        instance: Instance,
    },
    FactoryCall {
        target: TypeKey,
        factory: FactoryFn,
    },
}

#[derive(Clone)]
pub struct ConstructionPlan {
    node: Arc<PlanNode>,
}

impl ConstructionPlan {
    pub fn constructor(constructor: ConstructorDescriptor, children: Vec<ConstructionPlan>) -> Self {
        Self::from_node(PlanNode::Constructor {
            constructor,
            children,
        })
    }

    pub fn constant(instance: Instance) -> Self {
        Self::from_node(PlanNode::Constant { instance })
    }

    pub fn factory_call<F>(target: TypeKey, factory: F) -> Self
    where
        F: Fn() -> Result<Instance> + Send + Sync + 'static,
    {
        Self::from_factory(target, Arc::new(factory))
    }

    pub fn from_factory(target: TypeKey, factory: FactoryFn) -> Self {
        Self::from_node(PlanNode::FactoryCall { target, factory })
    }

    fn from_node(node: PlanNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &PlanNode {
        &self.node
    }

    /// Type of the instance this plan produces.
    pub fn target(&self) -> TypeKey {
        match self.node() {
            PlanNode::Constructor { constructor, .. } => constructor.owner(),
            PlanNode::Constant { instance } => instance.key(),
            PlanNode::FactoryCall { target, .. } => *target,
        }
    }

    pub fn children(&self) -> &[ConstructionPlan] {
        match self.node() {
            PlanNode::Constructor { children, .. } => children,
            _ => &[],
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.node(), PlanNode::Constructor { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.node(), PlanNode::Constant { .. })
    }

    /// Whether both plans are the very same node, not just equal in shape.
    pub fn same_node(&self, other: &ConstructionPlan) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Number of nodes, counting shared subtrees once per occurrence.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Turn the plan into a closure tree. Constructor nodes run their
    /// children first, in parameter order; constants are never rebuilt.
    pub fn compile(&self) -> CompiledFactory {
        match self.node() {
            PlanNode::Constant { instance } => {
                let instance = instance.clone();
                Arc::new(move || Ok(instance.clone()))
            }
            PlanNode::FactoryCall { factory, .. } => factory.clone(),
            PlanNode::Constructor {
                constructor,
                children,
            } => {
                let arguments: Vec<CompiledFactory> =
                    children.iter().map(ConstructionPlan::compile).collect();
                let constructor = constructor.clone();
                trace!(
                    "Compiled {}::{} with {} argument(s)",
                    constructor.owner(),
                    constructor.name(),
                    arguments.len()
                );
                Arc::new(move || {
                    let values = arguments
                        .iter()
                        .map(|argument| argument())
                        .collect::<Result<Vec<_>>>()?;
                    constructor.invoke(values)
                })
            }
        }
    }
}

impl fmt::Debug for ConstructionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            PlanNode::Constructor {
                constructor,
                children,
            } => f
                .debug_struct("Constructor")
                .field("target", &constructor.owner())
                .field("constructor", &constructor.name())
                .field("children", children)
                .finish(),
            PlanNode::Constant { instance } => f
                .debug_struct("Constant")
                .field("target", &instance.key())
                .field("empty", &instance.is_empty())
                .finish(),
            PlanNode::FactoryCall { target, .. } => {
                f.debug_struct("FactoryCall").field("target", target).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Leaf;

    struct Pair {
        left: Arc<Leaf>,
        right: Arc<Leaf>,
    }

    fn leaf_plan() -> ConstructionPlan {
        ConstructionPlan::constructor(ConstructorDescriptor::from_fn("new", || Leaf), vec![])
    }

    fn pair_descriptor() -> ConstructorDescriptor {
        ConstructorDescriptor::from_fn("new", |left: Arc<Leaf>, right: Arc<Leaf>| Pair {
            left,
            right,
        })
    }

    #[test]
    fn test_compiled_constructor_builds_fresh_graph() {
        let plan = ConstructionPlan::constructor(pair_descriptor(), vec![leaf_plan(), leaf_plan()]);
        assert_eq!(plan.target(), TypeKey::of::<Pair>());
        assert_eq!(plan.node_count(), 3);
        assert_eq!(plan.depth(), 2);

        let factory = plan.compile();
        let first = factory().unwrap().require::<Pair>().unwrap();
        let second = factory().unwrap().require::<Pair>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first.left, &first.right));
        assert!(!Arc::ptr_eq(&first.left, &second.left));
    }

    #[test]
    fn test_constant_children_are_shared() {
        let leaf = Arc::new(Leaf);
        let constant = ConstructionPlan::constant(Instance::new(leaf.clone()));
        let plan =
            ConstructionPlan::constructor(pair_descriptor(), vec![constant.clone(), constant]);

        let factory = plan.compile();
        let first = factory().unwrap().require::<Pair>().unwrap();
        let second = factory().unwrap().require::<Pair>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.left, &leaf));
        assert!(Arc::ptr_eq(&second.right, &leaf));
    }

    #[test]
    fn test_factory_call_runs_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let plan = ConstructionPlan::factory_call(TypeKey::of::<Leaf>(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Instance::new(Arc::new(Leaf)))
        });

        assert!(plan.children().is_empty());
        let factory = plan.compile();
        factory().unwrap();
        factory().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shared_nodes() {
        let leaf = leaf_plan();
        let plan = ConstructionPlan::constructor(pair_descriptor(), vec![leaf.clone(), leaf.clone()]);
        assert!(plan.children()[0].same_node(&leaf));
        assert!(plan.children()[1].same_node(&plan.children()[0]));
        assert!(!leaf.same_node(&leaf_plan()));
    }
}
