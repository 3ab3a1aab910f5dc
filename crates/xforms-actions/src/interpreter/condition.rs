use std::fmt;
use std::slice;

use tracing::debug;

use super::ActionInterpreter;
use crate::error::ActionError;
use crate::host::Host;
use crate::node::ActionNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    If,
    While,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConditionKind::If => "if",
            ConditionKind::While => "while",
        })
    }
}

/// Result of checking an `if` or `while` guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOutcome {
    Passed,
    EvaluatedFalse,
    /// No context item: the guard was not evaluated at all.
    MissingContext,
}

impl ConditionOutcome {
    pub fn passed(self) -> bool {
        self == ConditionOutcome::Passed
    }
}

impl<H: Host> ActionInterpreter<'_, H> {
    /// Check a guard against `context_item` alone.
    pub fn evaluate_condition(
        &self,
        action: &ActionNode,
        expression: &str,
        kind: ConditionKind,
        context_item: Option<&H::Item>,
    ) -> Result<ConditionOutcome, ActionError> {
        let Some(item) = context_item else {
            debug!(
                action = %action.name(),
                condition_type = %kind,
                reason = "missing context",
                "not executing"
            );
            return Ok(ConditionOutcome::MissingContext);
        };

        let result = self.evaluate_keep_items(
            action,
            slice::from_ref(item),
            1,
            &format!("boolean({expression})"),
        )?;
        let value = result.first().and_then(H::boolean_value).ok_or_else(|| {
            ActionError::NonBooleanCondition { kind, expression: expression.to_string() }
        })?;

        if value {
            Ok(ConditionOutcome::Passed)
        } else {
            debug!(
                action = %action.name(),
                condition_type = %kind,
                reason = "condition evaluated to 'false'",
                condition = expression,
                "not executing"
            );
            Ok(ConditionOutcome::EvaluatedFalse)
        }
    }
}
