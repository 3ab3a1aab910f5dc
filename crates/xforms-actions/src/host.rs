use std::fmt;

use crate::error::ActionError;
use crate::ids;
use crate::node::Scope;

/// Types an embedding plugs into the interpreter.
pub trait Host: 'static {
    /// Item of an evaluation sequence (node or atomic value).
    type Item: Clone + fmt::Debug;
    /// Live object addressable by effective id (control, model, ...).
    type Object: Clone + fmt::Debug;
    /// Event that triggered the outer action.
    type Event: fmt::Debug;

    /// Boolean value of an item produced by `boolean(...)`, if it is one.
    fn boolean_value(item: &Self::Item) -> Option<bool>;
}

/// Id resolution within the component that holds the running actions.
pub trait Container<H: Host> {
    /// Prefix prepended to static ids of elements in this container.
    fn full_prefix(&self) -> &str;

    fn scope_for_prefixed_id(&self, prefixed_id: &str) -> Option<Scope>;

    /// Resolve a static or absolute id as seen from `source_effective_id`.
    fn resolve_object_by_id_in_scope(
        &self,
        source_effective_id: &str,
        target_id: &str,
        indexes_hint: Option<&str>,
    ) -> Option<H::Object>;

    fn prefixed_id_of(&self, object: &H::Object) -> String;

    /// Effective id of `object` at the explicitly given repeat indexes.
    ///
    /// The default appends all indexes to the object's prefixed id and
    /// ignores the action's own repeat nesting, so indexes are always
    /// absolute. Containers that know which repeats the action and the
    /// target share override this to apply the indexes relative to them.
    fn resolve_repeat_indexes(
        &self,
        object: &H::Object,
        _action_prefixed_id: &str,
        repeat_indexes: &str,
    ) -> Result<String, ActionError> {
        let indexes = ids::parse_repeat_indexes(repeat_indexes)?;
        Ok(ids::effective_id_with_indexes(&self.prefixed_id_of(object), &indexes))
    }

    fn object_by_effective_id(&self, effective_id: &str) -> Option<H::Object>;
}
