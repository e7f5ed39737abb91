use tracing::{debug, warn};

use crate::{
    errors::{DiError, Result},
    plan::{ConstructionPlan, PlanNode},
    registry::Registry,
};

/// Depth-first check that every constructor dependency inside `plan` refers to
/// a registered type. Stops at the first violation.
///
/// Constants and factory calls are leaves and always pass. The root is the
/// type being registered and is not checked itself.
pub fn validate(plan: &ConstructionPlan, registry: &Registry) -> Result<()> {
    visit(plan, registry)?;
    debug!("Validated plan for {} ({} nodes)", plan.target(), plan.node_count());
    Ok(())
}

fn visit(plan: &ConstructionPlan, registry: &Registry) -> Result<()> {
    let PlanNode::Constructor { children, .. } = plan.node() else {
        return Ok(());
    };

    for child in children {
        if child.is_constructor() && !registry.is_registered(&child.target()) {
            warn!(
                "Plan for {} depends on unregistered {}",
                plan.target(),
                child.target()
            );
            return Err(DiError::UnregisteredType {
                type_key: child.target(),
            });
        }
        visit(child, registry)?;
    }
    Ok(())
}
