use super::ActionInterpreter;
use crate::error::ActionError;
use crate::host::Host;
use crate::node::ActionNode;

impl<H: Host> ActionInterpreter<'_, H> {
    /// Find the live object `target_id` refers to from `action`.
    ///
    /// With a repeat-indexes attribute on the action, the object is looked up
    /// at those indexes instead of the current repeat iteration.
    pub fn resolve_object(
        &self,
        action: &ActionNode,
        target_id: &str,
    ) -> Result<Option<H::Object>, ActionError> {
        let container = self.env.container;
        let source_effective_id = self.source_effective_id(action);
        let Some(object) =
            container.resolve_object_by_id_in_scope(&source_effective_id, target_id, None)
        else {
            return Ok(None);
        };

        let repeat_indexes = self.resolve_avt(action, &self.env.config.repeat_indexes_attribute)?;
        match repeat_indexes.as_deref().map(str::trim) {
            None | Some("") => Ok(Some(object)),
            Some(indexes) => {
                let effective_id = container.resolve_repeat_indexes(
                    &object,
                    &self.action_prefixed_id(action),
                    indexes,
                )?;
                Ok(container.object_by_effective_id(&effective_id))
            }
        }
    }

    pub fn is_deferred_updates(&self, action: &ActionNode) -> Result<bool, ActionError> {
        if self.stack.current_frame().single_item().is_none() {
            return Ok(true);
        }
        let value = self.resolve_avt(action, &self.env.config.deferred_updates_attribute)?;
        Ok(value.as_deref() != Some("false"))
    }
}
