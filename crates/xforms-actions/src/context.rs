//! Binding frames and the context stack contract.

use std::sync::Arc;

use crate::error::{EvalError, LocationData};
use crate::eval::Variables;
use crate::host::Host;
use crate::node::{ActionNode, NamespaceMapping, Scope};

#[derive(Debug, Clone, thiserror::Error)]
pub enum BindingError {
    #[error(transparent)]
    Evaluation(#[from] EvalError),
    #[error("model `{0}` not found")]
    UnknownModel(String),
    #[error("bind `{0}` not found")]
    UnknownBind(String),
    #[error("iteration {index} out of range for a sequence of {len} items")]
    IterationOutOfRange { index: usize, len: usize },
}

/// One entry of the context stack.
#[derive(Debug, Clone)]
pub struct BindingFrame<I> {
    sequence: Vec<I>,
    position: usize,
    context_item: Option<I>,
    variables: Arc<Variables<I>>,
    has_overridden_context: bool,
    model_id: Option<String>,
}

impl<I: Clone> BindingFrame<I> {
    pub fn new(sequence: Vec<I>, position: usize, context_item: Option<I>) -> Self {
        Self {
            sequence,
            position,
            context_item,
            variables: Arc::new(Variables::new()),
            has_overridden_context: false,
            model_id: None,
        }
    }

    /// Frame positioned on the first item, which is also the context item.
    pub fn root(sequence: Vec<I>) -> Self {
        let position = usize::from(!sequence.is_empty());
        let context_item = sequence.first().cloned();
        Self::new(sequence, position, context_item)
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, None)
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Vec<I>) -> Self {
        Arc::make_mut(&mut self.variables).insert(name.into(), value);
        self
    }

    pub fn with_variables(mut self, variables: Arc<Variables<I>>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_overridden_context(mut self, overridden: bool) -> Self {
        self.has_overridden_context = overridden;
        self
    }

    pub fn with_model(mut self, model_id: Option<String>) -> Self {
        self.model_id = model_id;
        self
    }

    pub fn sequence(&self) -> &[I] {
        &self.sequence
    }

    /// 1-based position into the sequence, 0 for an empty sequence.
    pub fn position(&self) -> usize {
        self.position
    }

    /// In-scope context item; for a `ref` binding this is the item the
    /// binding was evaluated against, not the bound item.
    pub fn context_item(&self) -> Option<&I> {
        self.context_item.as_ref()
    }

    /// The item at the current position, if any.
    pub fn single_item(&self) -> Option<&I> {
        self.position.checked_sub(1).and_then(|index| self.sequence.get(index))
    }

    pub fn variables(&self) -> &Variables<I> {
        &self.variables
    }

    pub fn shared_variables(&self) -> Arc<Variables<I>> {
        Arc::clone(&self.variables)
    }

    pub fn has_overridden_context(&self) -> bool {
        self.has_overridden_context
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }
}

/// Arguments of one `push_binding` call.
#[derive(Debug, Clone, Copy)]
pub struct BindingSpec<'b> {
    /// `ref` or `iterate` expression selecting the frame's sequence.
    pub select: Option<&'b str>,
    pub context: Option<&'b str>,
    pub model: Option<&'b str>,
    pub bind: Option<&'b str>,
    pub namespaces: &'b NamespaceMapping,
    pub source_effective_id: &'b str,
    pub scope: &'b Scope,
    pub location: Option<&'b LocationData>,
    pub inner: bool,
}

impl<'b> BindingSpec<'b> {
    /// Binding anchored at `action`, with no binding attributes set.
    pub fn for_action(action: &'b ActionNode, source_effective_id: &'b str) -> Self {
        Self {
            select: None,
            context: None,
            model: None,
            bind: None,
            namespaces: action.namespaces(),
            source_effective_id,
            scope: action.scope(),
            location: action.location(),
            inner: false,
        }
    }

    pub fn with_select(mut self, select: Option<&'b str>) -> Self {
        self.select = select;
        self
    }

    pub fn with_context(mut self, context: Option<&'b str>) -> Self {
        self.context = context;
        self
    }

    pub fn with_model(mut self, model: Option<&'b str>) -> Self {
        self.model = model;
        self
    }

    pub fn with_bind(mut self, bind: Option<&'b str>) -> Self {
        self.bind = bind;
        self
    }
}

/// Dynamically scoped evaluation environment. Callers keep pushes and pops
/// strictly balanced.
pub trait ContextStack<H: Host> {
    fn push_binding(&mut self, spec: &BindingSpec<'_>) -> Result<(), BindingError>;

    /// Push a frame selecting the 1-based `index` of the current sequence.
    fn push_iteration(&mut self, index: usize) -> Result<(), BindingError>;

    fn pop_binding(&mut self);

    fn current_frame(&self) -> &BindingFrame<H::Item>;

    fn depth(&self) -> usize;
}
