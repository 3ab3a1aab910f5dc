use super::ActionInterpreter;
use crate::error::ActionError;
use crate::eval::EvalRequest;
use crate::host::Host;
use crate::node::{ActionNode, AttributeKey};

/// Whether `value` may contain an embedded expression.
pub fn maybe_avt(value: &str) -> bool {
    value.contains('{')
}

impl<H: Host> ActionInterpreter<'_, H> {
    /// Resolve the attribute `key` of `action`, evaluating it as an
    /// attribute value template when needed.
    ///
    /// `None` when the attribute is absent, or when it is a template and the
    /// current frame has no single item to evaluate it against.
    pub fn resolve_avt<'k>(
        &self,
        action: &ActionNode,
        key: impl Into<AttributeKey<'k>>,
    ) -> Result<Option<String>, ActionError> {
        self.resolve_avt_value(action, action.attribute(key))
    }

    pub fn resolve_avt_value(
        &self,
        action: &ActionNode,
        raw: Option<&str>,
    ) -> Result<Option<String>, ActionError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        if !maybe_avt(raw) {
            return Ok(Some(raw.to_string()));
        }

        let frame = self.stack.current_frame();
        if frame.single_item().is_none() {
            return Ok(None);
        }
        let function_context = self.function_context(action);
        let request = EvalRequest::<H> {
            sequence: frame.sequence(),
            position: frame.position(),
            expression: raw,
            namespaces: action.namespaces(),
            variables: frame.variables(),
            function_context: &function_context,
            location: action.location(),
        };
        Ok(Some(self.env.evaluator.evaluate_as_avt(&request)?))
    }
}
