use crate::context::BindingFrame;
use crate::error::ActionError;
use crate::host::Host;
use crate::interpreter::ActionInterpreter;
use crate::node::{ActionNode, AttributeKey};

/// Per-dispatch view handed to an action handler. Built fresh for every
/// execution and dropped when the handler returns.
pub struct DynamicActionContext<'i, 'a, H: Host> {
    interpreter: &'i mut ActionInterpreter<'a, H>,
    action: &'i ActionNode,
    overridden_context: Option<H::Item>,
}

impl<'i, 'a, H: Host> DynamicActionContext<'i, 'a, H> {
    pub(crate) fn new(
        interpreter: &'i mut ActionInterpreter<'a, H>,
        action: &'i ActionNode,
        overridden_context: Option<H::Item>,
    ) -> Self {
        Self { interpreter, action, overridden_context }
    }

    pub fn interpreter(&self) -> &ActionInterpreter<'a, H> {
        &*self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut ActionInterpreter<'a, H> {
        &mut *self.interpreter
    }

    pub fn action(&self) -> &'i ActionNode {
        self.action
    }

    /// Context item set by `iterate` or `context`, if any.
    pub fn overridden_context(&self) -> Option<&H::Item> {
        self.overridden_context.as_ref()
    }

    /// Frame holding the action's `ref`/`bind` binding.
    pub fn binding_frame(&self) -> &BindingFrame<H::Item> {
        self.interpreter.context_stack().current_frame()
    }

    /// Item bound by `ref`/`bind`, or the in-scope item without a binding.
    pub fn bound_item(&self) -> Option<&H::Item> {
        self.binding_frame().single_item()
    }

    pub fn source_effective_id(&self) -> String {
        self.interpreter.source_effective_id(self.action)
    }

    pub fn resolve_avt<'k>(
        &self,
        key: impl Into<AttributeKey<'k>>,
    ) -> Result<Option<String>, ActionError> {
        self.interpreter.resolve_avt(self.action, key)
    }

    pub fn resolve_object(&self, target_id: &str) -> Result<Option<H::Object>, ActionError> {
        self.interpreter.resolve_object(self.action, target_id)
    }

    pub fn is_deferred_updates(&self) -> Result<bool, ActionError> {
        self.interpreter.is_deferred_updates(self.action)
    }

    /// Run the action's child actions in document order.
    pub fn run_nested_actions(&mut self) -> Result<(), ActionError> {
        let action = self.action;
        for child in action.children() {
            self.interpreter.run_action(child)?;
        }
        Ok(())
    }
}
