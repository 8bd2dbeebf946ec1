use super::validate_scope;
use super::Constraint;
use crate::basic_types::ModelError;
use crate::basic_types::PropagationStatus;
use crate::engine::DomainEvent;
use crate::engine::PostContext;
use crate::engine::PropagationContext;
use crate::engine::ReadDomains;
use crate::engine::VariableId;

/// Creates the constraint `x <= y`.
pub fn less_or_equal(x: VariableId, y: VariableId) -> Result<LessOrEqual, ModelError> {
    validate_scope(&[x, y])?;
    Ok(LessOrEqual { scope: [x, y] })
}

/// Bounds filtering of `x <= y`.
#[derive(Debug, Clone)]
pub struct LessOrEqual {
    scope: [VariableId; 2],
}

impl Constraint for LessOrEqual {
    fn name(&self) -> &str {
        "LessOrEqual"
    }

    fn scope(&self) -> &[VariableId] {
        &self.scope
    }

    fn post(&mut self, mut context: PostContext<'_>) {
        context.register(self.scope[0], DomainEvent::Bounds);
        context.register(self.scope[1], DomainEvent::Bounds);
    }

    fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
        let [x, y] = self.scope;

        context.remove_above(x, context.max(y))?;
        context.remove_below(y, context.min(x))?;

        if context.max(x) <= context.min(y) {
            context.set_inactive();
        }

        Ok(())
    }
}
