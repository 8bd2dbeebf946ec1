use super::validate_scope;
use super::Constraint;
use crate::basic_types::ModelError;
use crate::basic_types::PropagationStatus;
use crate::engine::DomainEvent;
use crate::engine::PostContext;
use crate::engine::PropagationContext;
use crate::engine::ReadDomains;
use crate::engine::VariableId;

/// Creates the constraint `x != y + offset`.
pub fn not_equal(x: VariableId, y: VariableId, offset: i32) -> Result<NotEqual, ModelError> {
    validate_scope(&[x, y])?;
    Ok(NotEqual {
        scope: [x, y],
        offset,
    })
}

/// `x != y + offset`; only propagates once one side is bound, after which it is subsumed.
#[derive(Debug, Clone)]
pub struct NotEqual {
    scope: [VariableId; 2],
    offset: i32,
}

impl Constraint for NotEqual {
    fn name(&self) -> &str {
        "NotEqual"
    }

    fn scope(&self) -> &[VariableId] {
        &self.scope
    }

    fn post(&mut self, mut context: PostContext<'_>) {
        context.register(self.scope[0], DomainEvent::Bind);
        context.register(self.scope[1], DomainEvent::Bind);
    }

    fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
        let [x, y] = self.scope;

        if context.is_bound(x) {
            context.remove(y, context.min(x) - self.offset)?;
            context.set_inactive();
        } else if context.is_bound(y) {
            context.remove(x, context.min(y) + self.offset)?;
            context.set_inactive();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PropagationMode;
    use crate::engine::SolverOptions;
    use crate::Inconsistency;
    use crate::Solver;

    fn classical() -> Solver {
        Solver::with_options(SolverOptions {
            mode: PropagationMode::Classical,
            ..Default::default()
        })
    }

    #[test]
    fn binding_one_side_removes_the_shifted_value() {
        let mut solver = classical();
        let x = solver.new_variable(0, 5, None);
        let y = solver.new_variable(0, 5, None);
        let id = solver.post(not_equal(x, y, 2).unwrap()).unwrap();
        assert!(solver.is_active(id));

        solver.assign(y, 1).unwrap();
        solver.propagate().unwrap();

        assert!(!solver.contains(x, 3));
        assert_eq!(solver.size(x), 5);
        assert!(!solver.is_active(id));
    }

    #[test]
    fn equal_bound_sides_are_inconsistent() {
        let mut solver = classical();
        let x = solver.new_variable(4, 4, None);
        let y = solver.new_variable(4, 4, None);

        assert_eq!(
            solver.post(not_equal(x, y, 0).unwrap()),
            Err(Inconsistency::EmptyDomain(y))
        );
    }

    #[test]
    fn subsumption_is_undone_on_backtrack() {
        let mut solver = classical();
        let x = solver.new_variable(0, 2, None);
        let y = solver.new_variable(0, 2, None);
        let id = solver.post(not_equal(x, y, 0).unwrap()).unwrap();

        let token = solver.save_state();
        solver.assign(x, 0).unwrap();
        solver.propagate().unwrap();
        assert!(!solver.is_active(id));
        solver.restore_state(token);

        assert!(solver.is_active(id));
        assert!(solver.contains(y, 0));
    }
}
